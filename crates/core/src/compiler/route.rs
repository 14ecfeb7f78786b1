//! Source/target language pairs the transform playground offers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ts,
    Es6,
    Es5,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ts => "ts",
            Self::Es6 => "es6",
            Self::Es5 => "es5",
        }
    }

    /// Editor language id used for syntax highlighting.
    pub fn editor_language(self) -> &'static str {
        match self {
            Self::Ts => "typescript",
            Self::Es6 | Self::Es5 => "javascript",
        }
    }

    /// Extension a compiler should assume for source in this language.
    pub fn file_extension(self) -> &'static str {
        match self {
            Self::Ts => "ts",
            Self::Es6 | Self::Es5 => "js",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ts" => Ok(Self::Ts),
            "es6" => Ok(Self::Es6),
            "es5" => Ok(Self::Es5),
            other => Err(CoreError::NotFound {
                entity: "Language",
                id: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Route {
    pub origin: Language,
    pub target: Language,
}

/// Every supported transform, in display order.
pub const ROUTES: &[Route] = &[
    Route::new(Language::Es6, Language::Es5),
    Route::new(Language::Ts, Language::Es6),
    Route::new(Language::Ts, Language::Es5),
];

impl Route {
    pub const fn new(origin: Language, target: Language) -> Self {
        Self { origin, target }
    }

    /// Parse a route from path segments, rejecting pairs not in [`ROUTES`].
    pub fn parse(origin: &str, target: &str) -> Result<Self, CoreError> {
        let route = Self::new(origin.parse()?, target.parse()?);
        if ROUTES.contains(&route) {
            Ok(route)
        } else {
            Err(CoreError::NotFound {
                entity: "Route",
                id: route.to_string(),
            })
        }
    }

    /// ECMAScript version name compilers understand.
    pub fn ecma_target(self) -> &'static str {
        match self.target {
            Language::Es5 => "es5",
            Language::Es6 | Language::Ts => "es2022",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.origin, self.target)
    }
}
