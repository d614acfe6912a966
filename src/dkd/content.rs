/* This file is part of dimcore.
 *
 * Copyright (C) 2020-2026 dimcore contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Content: an opaque, typed payload map (spec §3, §4.3). The core never
//! interprets a content body beyond its `type` tag and two structural
//! predicates (`is_file` and `is_command`); concrete payload subclasses
//! (text/image/audio/file bodies) are an external collaborator per spec
//! §1's exclusions.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Content {
    pub content_type: String,
    pub sn: u32,
    pub time: Option<f64>,
    pub group: Option<String>,
    pub extra: Map<String, Value>,
}

impl Content {
    pub fn new(content_type: impl Into<String>, sn: u32) -> Self {
        Self { content_type: content_type.into(), sn, time: None, group: None, extra: Map::new() }
    }

    /// A `FileContent` still carrying raw `data` must be uploaded before
    /// it can be sent (spec §4.4.1 step 4, §7 "File-not-uploaded").
    pub fn is_file_with_raw_data(&self) -> bool {
        self.content_type.eq_ignore_ascii_case("file") && self.extra.contains_key("data")
    }

    /// Commands suppress visa-time attachment on send (spec §4.4.1 step 1).
    pub fn is_command(&self) -> bool {
        self.content_type.eq_ignore_ascii_case("command") || self.extra.contains_key("command")
    }

    pub fn to_json(&self) -> Value {
        let mut map = self.extra.clone();
        map.insert("type".into(), Value::String(self.content_type.clone()));
        map.insert("sn".into(), Value::from(self.sn));
        if let Some(t) = self.time {
            map.insert("time".into(), Value::from(t));
        }
        if let Some(g) = &self.group {
            map.insert("group".into(), Value::String(g.clone()));
        }
        Value::Object(map)
    }

    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(Error::Validation("content must be a JSON object".into()))
        };
        let content_type = map
            .remove("type")
            .and_then(|v| v.as_str().map(str::to_string))
            .ok_or_else(|| Error::Validation("content missing 'type'".into()))?;
        let sn = map
            .remove("sn")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| Error::Validation("content missing 'sn'".into()))? as u32;
        let time = map.remove("time").and_then(|v| v.as_f64());
        let group = map.remove("group").and_then(|v| v.as_str().map(str::to_string));
        Ok(Self { content_type, sn, time, group, extra: map })
    }
}
