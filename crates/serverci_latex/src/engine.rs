//! TeX engine selection.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// How much of the source is searched for an engine directive.
pub const DIRECTIVE_SCAN_BYTES: usize = 8192;

static TS_PROGRAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^\s*%!TEX\s+TS-program\s*=\s*(\S+)\s*$").expect("directive pattern")
});

/// A TeX engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Engine {
    #[default]
    PdfLatex,
    XeLatex,
    LuaLatex,
}

impl Engine {
    /// Binary name of the engine.
    pub fn binary(self) -> &'static str {
        match self {
            Self::PdfLatex => "pdflatex",
            Self::XeLatex => "xelatex",
            Self::LuaLatex => "lualatex",
        }
    }

    /// latexmk mode flag selecting this engine.
    pub fn latexmk_flag(self) -> &'static str {
        match self {
            Self::PdfLatex => "-pdf",
            Self::XeLatex => "-pdfxe",
            Self::LuaLatex => "-pdflua",
        }
    }

    /// The engine named by a `%!TEX TS-program = <name>` line near the top
    /// of the source. Unrecognized names count as no directive.
    pub fn detect(source: &[u8]) -> Option<Self> {
        let head = &source[..source.len().min(DIRECTIVE_SCAN_BYTES)];
        let head = String::from_utf8_lossy(head);
        TS_PROGRAM
            .captures(&head)
            .and_then(|caps| caps[1].parse().ok())
    }

    /// The directive's engine, or pdflatex.
    pub fn select(source: &[u8]) -> Self {
        Self::detect(source).unwrap_or_default()
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pdflatex" => Ok(Self::PdfLatex),
            "xelatex" => Ok(Self::XeLatex),
            "lualatex" => Ok(Self::LuaLatex),
            other => Err(format!("unknown engine: {other}")),
        }
    }
}
