// Copyright (c) Contributors to the cpk project.
// SPDX-License-Identifier: Apache-2.0
// https://github.com/cpkenv/cpk

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The architecture a package is built for.
///
/// Written as a `<platform>-<os>-<target>` triple,
/// eg: `linux-ubuntu20.04-x86_64`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Arch {
    pub platform: String,
    pub os: String,
    pub target: String,
}

impl Arch {
    pub fn new<P, O, T>(platform: P, os: O, target: T) -> Self
    where
        P: Into<String>,
        O: Into<String>,
        T: Into<String>,
    {
        Self {
            platform: platform.into(),
            os: os.into(),
            target: target.into(),
        }
    }

    /// The architecture of the current host process.
    pub fn host() -> Self {
        Self {
            platform: std::env::consts::OS.to_string(),
            os: "unknown".to_string(),
            target: std::env::consts::ARCH.to_string(),
        }
    }
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.platform, self.os, self.target)
    }
}

impl FromStr for Arch {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let mut parts = s.splitn(3, '-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(platform), Some(os), Some(target))
                if !platform.is_empty() && !os.is_empty() && !target.is_empty() =>
            {
                Ok(Self::new(platform, os, target))
            }
            _ => Err(crate::Error::InvalidArch(s.to_string())),
        }
    }
}

impl Serialize for Arch {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Arch {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
