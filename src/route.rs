use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ItemId;

static ITEM_ROUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/item/(\d+)/?$").expect("valid item route regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("unknown route: {0}")]
    Unknown(String),
    #[error("item id out of range: {0}")]
    BadId(String),
}

/// Navigable storefront locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ItemDetail(ItemId),
    Sell,
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.trim();
        if path == "/sell" || path == "/sell/" {
            return Ok(Route::Sell);
        }
        let caps = ITEM_ROUTE
            .captures(path)
            .ok_or_else(|| RouteError::Unknown(path.to_string()))?;
        let id = caps[1]
            .parse::<ItemId>()
            .map_err(|_| RouteError::BadId(caps[1].to_string()))?;
        Ok(Route::ItemDetail(id))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::ItemDetail(id) => write!(f, "/item/{}", id),
            Route::Sell => write!(f, "/sell"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_format() {
        assert_eq!("/item/12".parse::<Route>(), Ok(Route::ItemDetail(12)));
        assert_eq!("/item/12/".parse::<Route>(), Ok(Route::ItemDetail(12)));
        assert_eq!("/sell".parse::<Route>(), Ok(Route::Sell));
        assert_eq!(Route::ItemDetail(3).to_string(), "/item/3");
    }

    #[test]
    fn rejects_unknown_paths() {
        assert!(matches!("/item/abc".parse::<Route>(), Err(RouteError::Unknown(_))));
        assert!(matches!("/items/1".parse::<Route>(), Err(RouteError::Unknown(_))));
        assert!(matches!(
            "/item/99999999999999999999".parse::<Route>(),
            Err(RouteError::BadId(_))
        ));
    }
}
