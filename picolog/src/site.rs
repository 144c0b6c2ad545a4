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

//! Call-site metadata records and identifier derivation.
//!
//! Every textual log invocation interns one [`CallSite`] record into a
//! dedicated linker section (`picolog_sites` on ELF, `__DATA,__picolog` on
//! Mach-O).  Records are 256 bytes and 256-byte aligned, so consecutive
//! records occupy consecutive 256-byte buckets and the identifier of a
//! record is just its bucket index: `(address - section_start) >> 8`.  The
//! derivation is a single subtraction and shift with no memory load; the
//! table itself is only ever *read* by host-side tools (and by the
//! in-process [`SiteTable`] walk the test decoder uses).

use crate::level::Severity;
use crate::packet::{RawId, MAX_SITES};

/// Capacity of the NUL-terminated source path field.
pub const FILE_CAPACITY: usize = 116;

/// Capacity of the NUL-terminated format string field.
pub const FMT_CAPACITY: usize = 128;

/// One interned call-site record.
///
/// The layout is part of the metadata format shared with the host:
///
/// | offset | size | field |
/// |--------|------|-------|
/// | 0      | 1    | severity |
/// | 4      | 4    | line |
/// | 8      | 4    | type code |
/// | 12     | 116  | source path, NUL terminated |
/// | 128    | 128  | format string, NUL terminated |
#[repr(C, align(256))]
pub struct CallSite {
    level: u8,
    line: u32,
    typecode: u32,
    file: [u8; FILE_CAPACITY],
    fmt: [u8; FMT_CAPACITY],
}

// The identifier derivation relies on one record per 256-byte bucket.
const _: () = assert!(core::mem::size_of::<CallSite>() == 256);

/// Copies `s` into a NUL-terminated fixed array, keeping the *tail* when it
/// does not fit.  Source paths overflow from the left so the file name
/// stays visible; the cut lands on a UTF-8 boundary.
const fn tail_copy<const N: usize>(s: &str) -> [u8; N] {
    let bytes = s.as_bytes();
    let mut out = [0u8; N];

    let mut start = if bytes.len() > N - 1 {
        bytes.len() - (N - 1)
    } else {
        0
    };
    while start < bytes.len() && (bytes[start] & 0xc0) == 0x80 {
        start += 1;
    }

    let mut i = 0;
    while start + i < bytes.len() {
        out[i] = bytes[start + i];
        i += 1;
    }
    out
}

impl CallSite {
    /// Builds a record; evaluated at compile time by generated call-site
    /// code.  Format strings longer than the field are a compile-time
    /// error.
    pub const fn new(
        severity: Severity,
        line: u32,
        typecode: u32,
        file: &str,
        fmt: &str,
    ) -> Self {
        assert!(
            fmt.len() < FMT_CAPACITY,
            "log format string exceeds the 127-byte metadata field"
        );
        Self {
            level: severity as u8,
            line,
            typecode,
            file: tail_copy(file),
            fmt: tail_copy(fmt),
        }
    }

    /// The call site's severity.
    pub fn severity(&self) -> Severity {
        // Records are only ever built from a `Severity`, so the stored
        // byte is always in range.
        Severity::from_repr(self.level).unwrap_or(Severity::Error)
    }

    /// The source line of the invocation.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// The packed argument type code.
    pub fn typecode(&self) -> u32 {
        self.typecode
    }

    /// The source path, up to its NUL terminator.
    pub fn file(&self) -> &str {
        field_str(&self.file)
    }

    /// The format string, up to its NUL terminator.
    pub fn fmt(&self) -> &str {
        field_str(&self.fmt)
    }
}

fn field_str(field: &[u8]) -> &str {
    let len = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    // Fields are built from `&str` with truncation on a UTF-8 boundary.
    core::str::from_utf8(&field[..len]).unwrap_or("")
}

// Section bounds provided by the linker.  On ELF targets the symbols exist
// automatically because the section name is a valid C identifier; Mach-O
// section names are limited to 16 characters and bounds come from the
// `section$start`/`section$end` notation instead.
#[cfg(not(target_os = "macos"))]
#[allow(non_upper_case_globals)]
extern "C" {
    static __start_picolog_sites: CallSite;
    static __stop_picolog_sites: CallSite;
}

#[cfg(target_os = "macos")]
#[allow(non_upper_case_globals)]
extern "C" {
    #[link_name = "\u{1}section$start$__DATA$__picolog"]
    static __start_picolog_sites: CallSite;
    #[link_name = "\u{1}section$end$__DATA$__picolog"]
    static __stop_picolog_sites: CallSite;
}

// The boundary symbols above are undefined in an image whose metadata
// section is empty.  The runtime anchors one record of its own so the
// section exists wherever the bounds are referenced, even before the first
// user call-site is linked.  Host tools see it as an ordinary record.
#[cfg_attr(target_os = "macos", link_section = "__DATA,__picolog")]
#[cfg_attr(not(target_os = "macos"), link_section = "picolog_sites")]
#[used]
static SECTION_ANCHOR: CallSite =
    CallSite::new(Severity::Mile, 0, 0, "", "<picolog metadata table>");

fn section_bounds() -> (usize, usize) {
    core::hint::black_box(&SECTION_ANCHOR);
    // SAFETY: the symbols delimit the metadata section; only their
    // addresses are taken, the memory behind them is never dereferenced
    // here.
    unsafe {
        (
            core::ptr::addr_of!(__start_picolog_sites) as usize,
            core::ptr::addr_of!(__stop_picolog_sites) as usize,
        )
    }
}

/// Derives the identifier of an interned call-site record.
#[doc(hidden)]
pub fn site_id(record: &'static CallSite) -> RawId {
    let (base, _) = section_bounds();
    let id = ((record as *const CallSite as usize) - base) >> 8;
    debug_assert!(id < MAX_SITES, "call-site identifier space exhausted");
    id as RawId
}

/// In-process view of the interned metadata table.
///
/// This is the same walk a host tool performs over the image: one record
/// per 256-byte bucket from the start of the section to its end.
pub struct SiteTable;

impl SiteTable {
    /// Iterates over every call-site record linked into this image.
    pub fn iter() -> impl Iterator<Item = &'static CallSite> {
        let (start, stop) = section_bounds();
        (start..stop)
            .step_by(core::mem::size_of::<CallSite>())
            // SAFETY: the linker packs only `CallSite` records into the
            // section, one per 256-byte stride, and they live for the
            // whole process.
            .map(|addr| unsafe { &*(addr as *const CallSite) })
    }

    /// Looks up a record by its derived identifier.
    pub fn get(id: RawId) -> Option<&'static CallSite> {
        Self::iter().find(|record| site_id(record) == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Records interned by hand, the way generated call-site code does it.
    #[cfg_attr(target_os = "macos", link_section = "__DATA,__picolog")]
    #[cfg_attr(not(target_os = "macos"), link_section = "picolog_sites")]
    #[used]
    static SITE_A: CallSite = CallSite::new(Severity::Info, 17, 0, file!(), "first");

    #[cfg_attr(target_os = "macos", link_section = "__DATA,__picolog")]
    #[cfg_attr(not(target_os = "macos"), link_section = "picolog_sites")]
    #[used]
    static SITE_B: CallSite = CallSite::new(Severity::Warn, 23, 0x41, file!(), "second");

    #[test]
    fn record_is_one_bucket() {
        assert_eq!(core::mem::size_of::<CallSite>(), 256);
        assert_eq!(core::mem::align_of::<CallSite>(), 256);
    }

    #[test]
    fn accessors_return_interned_fields() {
        assert_eq!(SITE_A.severity(), Severity::Info);
        assert_eq!(SITE_A.line(), 17);
        assert_eq!(SITE_A.fmt(), "first");
        assert!(SITE_A.file().ends_with("site.rs"));
        assert_eq!(SITE_B.typecode(), 0x41);
    }

    #[test]
    fn identifiers_are_bucket_indices() {
        let id_a = site_id(&SITE_A);
        let id_b = site_id(&SITE_B);
        assert_ne!(id_a, id_b);

        let (base, _) = section_bounds();
        assert_eq!(
            id_a as usize,
            ((&SITE_A as *const CallSite as usize) - base) >> 8
        );
    }

    #[test]
    fn table_walk_finds_every_record() {
        let ids: Vec<_> = SiteTable::iter().map(site_id).collect();
        assert!(ids.contains(&site_id(&SITE_A)));
        assert!(ids.contains(&site_id(&SITE_B)));

        // Pairwise distinct across the whole image.
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn lookup_by_id_round_trips() {
        let record = SiteTable::get(site_id(&SITE_B)).unwrap();
        assert_eq!(record.fmt(), "second");
    }

    #[test]
    fn long_paths_keep_their_tail() {
        let long = "a/".repeat(80) + "leaf.rs";
        let record = CallSite::new(Severity::Info, 1, 0, &long, "x");
        assert!(record.file().ends_with("leaf.rs"));
        assert!(record.file().len() < FILE_CAPACITY);
    }
}
