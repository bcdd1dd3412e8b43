//! Paper registry: density bounds, per-grade contrast and tri-tone response.
//!
//! Papers are a closed set. Each [`PaperKind`] maps to one static [`Paper`]
//! record; string keys from projects and the command line are parsed through
//! [`PaperKind::from_str`](std::str::FromStr) so unknown stocks are rejected
//! at load time instead of surfacing mid-render.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DarkroomError;
use crate::exposure::{GRADE_COUNT, MAX_GRADE};

/// Contrast slope and speed shift for one filter grade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeParams {
    /// Slope of the characteristic curve in log-exposure units.
    pub k: f32,
    /// Extra stops of exposure needed to reach the same midtone.
    pub speed_shift_stops: f32,
}

/// RGB multipliers applied to each tonal zone of the finished print.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperTone {
    pub highlights: [f32; 3],
    pub midtones: [f32; 3],
    pub shadows: [f32; 3],
}

/// Static description of a printing paper.
#[derive(Debug, Clone, PartialEq)]
pub struct Paper {
    /// Registry key, e.g. `"ilford-multigrade"`.
    pub name: &'static str,
    /// Exposure time in seconds that lands the normal grade on a midtone.
    pub base_exposure: f32,
    /// Base + fog density.
    pub d_min: f32,
    /// Deepest black the paper can reach.
    pub d_max: f32,
    /// Grade table ordered from grade 00 (index 0) to grade 5 (index 11).
    pub grades: [GradeParams; GRADE_COUNT],
    pub tone: PaperTone,
}

impl Paper {
    /// Usable density range above base + fog.
    pub fn density_range(&self) -> f32 {
        self.d_max - self.d_min
    }

    /// Parameters for a grade index. Out-of-range indices are clamped.
    pub fn grade(&self, index: u8) -> &GradeParams {
        &self.grades[usize::from(index.min(MAX_GRADE))]
    }

    /// Log10 exposure that produces the midtone for a grade.
    ///
    /// ```text
    /// E0 = log10(base_exposure) + speed_shift_stops × log10(2)
    /// ```
    pub fn midtone_log_e(&self, grade: u8) -> f32 {
        self.base_exposure.max(f32::EPSILON).log10()
            + self.grade(grade).speed_shift_stops * std::f32::consts::LOG10_2
    }
}

/// The papers available for printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaperKind {
    /// Ilford Multigrade RC, the neutral reference stock.
    #[default]
    IlfordMultigrade,
    /// Ilford Multigrade FB Warmtone.
    IlfordWarmtone,
    /// Foma Fomatone MG: strongly warm with a low Dmax.
    FomaFomatone,
    /// Kentmere VC Select: slightly cool and fast.
    KentmereVcSelect,
}

impl PaperKind {
    /// Registry key used in project files and on the command line.
    pub fn key(self) -> &'static str {
        self.paper().name
    }

    /// Human-readable label for listings.
    pub const fn label(self) -> &'static str {
        match self {
            Self::IlfordMultigrade => "Ilford Multigrade RC",
            Self::IlfordWarmtone => "Ilford Multigrade Warmtone",
            Self::FomaFomatone => "Foma Fomatone MG",
            Self::KentmereVcSelect => "Kentmere VC Select",
        }
    }

    /// Static paper data for this kind.
    pub fn paper(self) -> &'static Paper {
        match self {
            Self::IlfordMultigrade => &ILFORD_MULTIGRADE,
            Self::IlfordWarmtone => &ILFORD_WARMTONE,
            Self::FomaFomatone => &FOMA_FOMATONE,
            Self::KentmereVcSelect => &KENTMERE_VC_SELECT,
        }
    }

    /// Every registered paper, in listing order.
    pub fn all() -> &'static [Self] {
        const ALL: [PaperKind; 4] = [
            PaperKind::IlfordMultigrade,
            PaperKind::IlfordWarmtone,
            PaperKind::FomaFomatone,
            PaperKind::KentmereVcSelect,
        ];
        &ALL
    }
}

impl fmt::Display for PaperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PaperKind {
    type Err = DarkroomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.key() == s)
            .ok_or_else(|| DarkroomError::UnknownPaper(s.to_owned()))
    }
}

/// Display label for a grade index (`"00"`, `"0"`, `"½"`, … `"5"`).
pub fn grade_label(index: u8) -> &'static str {
    const LABELS: [&str; GRADE_COUNT] = [
        "00", "0", "½", "1", "1½", "2", "2½", "3", "3½", "4", "4½", "5",
    ];
    LABELS[usize::from(index.min(MAX_GRADE))]
}

// ── Registry ────────────────────────────────────────────────────────

const fn g(k: f32, speed_shift_stops: f32) -> GradeParams {
    GradeParams {
        k,
        speed_shift_stops,
    }
}

static ILFORD_MULTIGRADE: Paper = Paper {
    name: "ilford-multigrade",
    base_exposure: 16.0,
    d_min: 0.06,
    d_max: 2.05,
    grades: [
        g(1.6, -1.0),
        g(2.0, -0.8),
        g(2.5, -0.6),
        g(3.0, -0.4),
        g(3.6, -0.2),
        g(4.2, 0.0),
        g(4.8, 0.15),
        g(5.5, 0.3),
        g(6.3, 0.5),
        g(7.2, 0.7),
        g(8.2, 0.9),
        g(9.4, 1.1),
    ],
    tone: PaperTone {
        highlights: [1.0, 1.0, 0.99],
        midtones: [0.98, 0.98, 0.98],
        shadows: [0.95, 0.96, 0.98],
    },
};

static ILFORD_WARMTONE: Paper = Paper {
    name: "ilford-warmtone",
    base_exposure: 20.0,
    d_min: 0.08,
    d_max: 2.10,
    grades: [
        g(1.5, -1.0),
        g(1.9, -0.8),
        g(2.4, -0.6),
        g(2.9, -0.4),
        g(3.5, -0.2),
        g(4.0, 0.0),
        g(4.6, 0.2),
        g(5.3, 0.4),
        g(6.0, 0.6),
        g(6.9, 0.8),
        g(7.8, 1.0),
        g(8.9, 1.2),
    ],
    tone: PaperTone {
        highlights: [1.0, 0.98, 0.93],
        midtones: [0.99, 0.95, 0.88],
        shadows: [0.97, 0.92, 0.85],
    },
};

static FOMA_FOMATONE: Paper = Paper {
    name: "foma-fomatone",
    base_exposure: 24.0,
    d_min: 0.10,
    d_max: 1.95,
    grades: [
        g(1.4, -0.9),
        g(1.8, -0.7),
        g(2.2, -0.5),
        g(2.7, -0.35),
        g(3.2, -0.15),
        g(3.8, 0.0),
        g(4.3, 0.2),
        g(4.9, 0.4),
        g(5.6, 0.6),
        g(6.4, 0.85),
        g(7.2, 1.1),
        g(8.1, 1.35),
    ],
    tone: PaperTone {
        highlights: [1.0, 0.96, 0.88],
        midtones: [0.98, 0.91, 0.80],
        shadows: [0.94, 0.86, 0.76],
    },
};

static KENTMERE_VC_SELECT: Paper = Paper {
    name: "kentmere-vc-select",
    base_exposure: 14.0,
    d_min: 0.05,
    d_max: 2.00,
    grades: [
        g(1.7, -1.1),
        g(2.1, -0.85),
        g(2.6, -0.6),
        g(3.1, -0.4),
        g(3.7, -0.2),
        g(4.3, 0.0),
        g(4.9, 0.1),
        g(5.6, 0.25),
        g(6.4, 0.45),
        g(7.3, 0.65),
        g(8.3, 0.85),
        g(9.5, 1.05),
    ],
    tone: PaperTone {
        highlights: [0.99, 1.0, 1.0],
        midtones: [0.96, 0.97, 0.99],
        shadows: [0.93, 0.95, 0.98],
    },
};
