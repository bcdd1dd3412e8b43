//! Binary `.ddr` project layout.
//!
//! ```text
//! magic        4 bytes  "DDRP"
//! version      u32      1
//! paper        u32 len + UTF-8
//! count        u32
//! per exposure:
//!   id         u32 len + UTF-8
//!   time       f64
//!   grade      i32
//!   has_mask   u8       0 or 1
//!   [width     u32
//!    height    u32
//!    mask      width × height bytes, round(m × 255)]
//! ```
//! All multi-byte values are little-endian.

use crate::error::ProjectError;
use crate::exposure::{Exposure, ExposureId, MAX_GRADE};
use crate::mask::Mask;
use crate::paper::PaperKind;
use crate::project::ProjectSnapshot;

/// Leading bytes of every binary project.
pub const MAGIC: [u8; 4] = *b"DDRP";
/// Current layout version.
pub const VERSION: u32 = 1;

/// Serialize a project to the binary layout.
pub fn encode(project: &ProjectSnapshot) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    put_str(&mut out, project.paper.key());
    put_u32(&mut out, project.exposures.len() as u32);
    for exposure in &project.exposures {
        put_str(&mut out, exposure.id.as_str());
        out.extend_from_slice(&exposure.time.to_le_bytes());
        out.extend_from_slice(&i32::from(exposure.grade).to_le_bytes());
        match &exposure.mask {
            Some(mask) => {
                out.push(1);
                put_u32(&mut out, mask.width());
                put_u32(&mut out, mask.height());
                out.extend_from_slice(&mask.to_bytes());
            }
            None => out.push(0),
        }
    }
    out
}

/// Parse a binary project.
pub fn decode(bytes: &[u8]) -> Result<ProjectSnapshot, ProjectError> {
    let mut r = Reader { bytes };
    if r.take(MAGIC.len(), "magic")? != MAGIC {
        return Err(ProjectError::BadMagic);
    }
    let version = r.u32("version")?;
    if version != VERSION {
        return Err(ProjectError::UnsupportedVersion(version));
    }

    let paper_key = r.string("paper")?;
    let paper: PaperKind = paper_key
        .parse()
        .map_err(|_| ProjectError::UnknownPaper(paper_key.clone()))?;

    let count = r.u32("exposure count")? as usize;
    // Each exposure needs at least 17 bytes; don't trust `count` for allocation.
    let mut exposures = Vec::with_capacity(count.min(r.bytes.len() / 17));
    for _ in 0..count {
        exposures.push(read_exposure(&mut r)?);
    }
    if !r.bytes.is_empty() {
        return Err(ProjectError::InvalidValue {
            field: "project",
            detail: format!("{} trailing bytes", r.bytes.len()),
        });
    }
    let project = ProjectSnapshot { paper, exposures };
    project.check_unique_ids()?;
    Ok(project)
}

fn read_exposure(r: &mut Reader<'_>) -> Result<Exposure, ProjectError> {
    let id = ExposureId::from(r.string("exposure id")?);

    let time = f64::from_le_bytes(r.array("exposure time")?);
    if !time.is_finite() || time <= 0.0 {
        return Err(ProjectError::InvalidValue {
            field: "exposure time",
            detail: format!("{time} is not a positive number of seconds"),
        });
    }

    let grade = i32::from_le_bytes(r.array("exposure grade")?);
    let grade = u8::try_from(grade)
        .ok()
        .filter(|&g| g <= MAX_GRADE)
        .ok_or_else(|| ProjectError::InvalidValue {
            field: "exposure grade",
            detail: format!("{grade} is outside 0..={MAX_GRADE}"),
        })?;

    let mask = match r.take(1, "mask flag")?[0] {
        0 => None,
        1 => {
            let width = r.u32("mask width")?;
            let height = r.u32("mask height")?;
            let len = (width as usize)
                .checked_mul(height as usize)
                .ok_or(ProjectError::Truncated("mask data"))?;
            Some(Mask::from_bytes(width, height, r.take(len, "mask data")?)?)
        }
        flag => {
            return Err(ProjectError::InvalidValue {
                field: "mask flag",
                detail: format!("expected 0 or 1, got {flag}"),
            });
        }
    };

    let mut exposure = Exposure::with_time_and_grade(time, grade);
    exposure.id = id;
    exposure.mask = mask;
    Ok(exposure)
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_str(out: &mut Vec<u8>, s: &str) {
    put_u32(out, s.len() as u32);
    out.extend_from_slice(s.as_bytes());
}

// ── Helpers ─────────────────────────────────────────────────────────

struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8], ProjectError> {
        if self.bytes.len() < n {
            return Err(ProjectError::Truncated(what));
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N], ProjectError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N, what)?);
        Ok(buf)
    }

    fn u32(&mut self, what: &'static str) -> Result<u32, ProjectError> {
        Ok(u32::from_le_bytes(self.array(what)?))
    }

    fn string(&mut self, what: &'static str) -> Result<String, ProjectError> {
        let len = self.u32(what)? as usize;
        let raw = self.take(len, what)?;
        String::from_utf8(raw.to_vec()).map_err(|_| ProjectError::InvalidUtf8(what))
    }
}
