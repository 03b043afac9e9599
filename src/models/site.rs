//! Supported catalog sources.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A catalog site the generator knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Douban,
    Imdb,
    Bangumi,
    Steam,
    Indienova,
    Epic,
}

impl Site {
    /// Every site, in the order URLs are matched against their patterns.
    pub const ALL: [Site; 6] = [
        Site::Douban,
        Site::Imdb,
        Site::Bangumi,
        Site::Steam,
        Site::Indienova,
        Site::Epic,
    ];

    /// Name used in query parameters and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Site::Douban => "douban",
            Site::Imdb => "imdb",
            Site::Bangumi => "bangumi",
            Site::Steam => "steam",
            Site::Indienova => "indienova",
            Site::Epic => "epic",
        }
    }

    /// URL pattern whose only capture group is the site-local id.
    pub fn pattern(&self) -> &'static str {
        match self {
            Site::Douban => {
                r"(?:https?://)?(?:(?:movie|www)\.)?douban\.com/(?:subject|movie)/(\d+)/?"
            }
            Site::Imdb => r"(?:https?://)?(?:www\.)?imdb\.com/title/(tt\d+)/?",
            Site::Bangumi => r"(?:https?://)?(?:bgm\.tv|bangumi\.tv|chii\.in)/subject/(\d+)/?",
            Site::Steam => r"(?:https?://)?(?:store\.)?steam(?:powered|community)\.com/app/(\d+)/?",
            Site::Indienova => r"(?:https?://)?indienova\.com/game/(\S+)",
            Site::Epic => {
                r"(?:https?://)?www\.epicgames\.com/store/[a-zA-Z-]+/product/(\S+)/\S?"
            }
        }
    }

    /// Canonical page for an item on this site.
    pub fn item_link(&self, sid: &str) -> String {
        match self {
            Site::Douban => format!("https://movie.douban.com/subject/{sid}/"),
            Site::Imdb => format!("https://www.imdb.com/title/{sid}/"),
            Site::Bangumi => format!("https://bgm.tv/subject/{sid}"),
            Site::Steam => format!("https://store.steampowered.com/app/{sid}/"),
            Site::Indienova => format!("https://indienova.com/game/{sid}"),
            Site::Epic => format!("https://www.epicgames.com/store/zh-CN/product/{sid}/home"),
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no supported site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSite(pub String);

impl fmt::Display for UnknownSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown site '{}'", self.0)
    }
}

impl std::error::Error for UnknownSite {}

impl FromStr for Site {
    type Err = UnknownSite;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Site::ALL
            .into_iter()
            .find(|site| site.as_str() == s)
            .ok_or_else(|| UnknownSite(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_site_name() {
        for site in Site::ALL {
            assert_eq!(site.as_str().parse::<Site>(), Ok(site));
        }
    }

    #[test]
    fn rejects_unknown_names() {
        assert!("netflix".parse::<Site>().is_err());
        assert!("Douban".parse::<Site>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Site::Indienova).unwrap();
        assert_eq!(json, "\"indienova\"");
    }
}
