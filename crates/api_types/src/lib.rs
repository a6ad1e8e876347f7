//! JSON shapes printed by the `coinstore` binary.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuthResponse {
        /// Account id (UUID), serialized as a string.
        pub id: Uuid,
    }
}

pub mod catalog {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CatalogEntry {
        pub name: String,
        pub price: i64,
    }
}

pub mod info {
    use super::*;

    /// Account overview: balance, owned items and coin movements.
    ///
    /// Both history lists are newest first.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InfoResponse {
        pub coins: i64,
        pub inventory: Vec<InventoryItem>,
        pub coin_history: CoinHistory,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct InventoryItem {
        /// Item name.
        #[serde(rename = "type")]
        pub kind: String,
        pub quantity: i64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CoinHistory {
        pub received: Vec<ReceivedCoins>,
        pub sent: Vec<SentCoins>,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ReceivedCoins {
        pub from_user: String,
        pub amount: i64,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SentCoins {
        pub to_user: String,
        pub amount: i64,
    }
}
