// Copyright 2025 The Pigweed Authors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy of
// the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations under
// the License.

/// Severity of a log call site.
///
/// Values are ordered most severe first; a call site is enabled when its
/// severity value is less than or equal to the configured threshold.  The
/// discriminants are part of the metadata format: the host reads the raw
/// byte out of the image, so they must not be renumbered.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Severity {
    /// Unrecoverable faults.
    Error = 0,
    /// Recoverable faults or unexpected conditions.
    Warn = 1,
    /// Milestones: rare, always-interesting lifecycle events.
    Mile = 2,
    /// Routine operational messages.
    Info = 3,
    /// Fine-grained control-flow tracing.
    Trace = 4,
    /// Developer debugging, least verbose tier.
    Debug0 = 5,
    /// Developer debugging.
    Debug1 = 6,
    /// Developer debugging.
    Debug2 = 7,
    /// Developer debugging, most verbose tier.
    Debug3 = 8,
}

impl Severity {
    /// Reconstructs a `Severity` from its metadata byte.
    pub const fn from_repr(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Error),
            1 => Some(Self::Warn),
            2 => Some(Self::Mile),
            3 => Some(Self::Info),
            4 => Some(Self::Trace),
            5 => Some(Self::Debug0),
            6 => Some(Self::Debug1),
            7 => Some(Self::Debug2),
            8 => Some(Self::Debug3),
            _ => None,
        }
    }

    /// Short tag used when rendering decoded lines.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Error => "ERR",
            Self::Warn => "WRN",
            Self::Mile => "MIL",
            Self::Info => "INF",
            Self::Trace => "TRC",
            Self::Debug0 => "DB0",
            Self::Debug1 => "DB1",
            Self::Debug2 => "DB2",
            Self::Debug3 => "DB3",
        }
    }
}
