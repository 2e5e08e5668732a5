//! Wire types for the Scryfall card catalog API.
//!
//! Only the fields the marketplace consumes are deserialized. Cards missing
//! optional attributes (digital-only printings without images, lands without
//! a mana cost) still map cleanly onto [`Card`].

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;

use rhystic_core::Money;

use crate::models::card::Card;

/// EUR to USD conversion applied when a card has no USD quote.
const EUR_TO_USD: Decimal = Decimal::from_parts(108, 0, 0, false, 2);

/// A card object as returned by `/cards/named` and `/cards/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScryfallCard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub oracle_text: Option<String>,
    #[serde(default)]
    pub mana_cost: Option<String>,
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
    #[serde(default)]
    pub prices: Prices,
    #[serde(default)]
    pub rarity: Option<String>,
}

/// Image variants; only the `normal` rendition is used.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageUris {
    #[serde(default)]
    pub normal: Option<String>,
}

/// Market price quotes. Strings per the API; absent markets are null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Prices {
    #[serde(default)]
    pub usd: Option<String>,
    #[serde(default)]
    pub eur: Option<String>,
}

/// A page of search results from `/cards/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub data: Vec<ScryfallCard>,
    #[serde(default)]
    pub total_cards: Option<i64>,
}

impl ScryfallCard {
    /// Map the catalog shape into the internal card attribute bundle.
    #[must_use]
    pub fn into_card(self) -> Card {
        let mana_cost = match self.mana_cost {
            Some(cost) if !cost.is_empty() => cost,
            _ => "{}".to_owned(),
        };

        Card {
            id: self.id,
            name: self.name,
            oracle_text: self.oracle_text.unwrap_or_default(),
            image_url: self
                .image_uris
                .and_then(|uris| uris.normal)
                .unwrap_or_default(),
            mana_cost,
            price: self.prices.reference_price(),
            rarity: self.rarity.unwrap_or_default(),
        }
    }
}

impl Prices {
    /// The reference price in USD.
    ///
    /// Prefers the USD quote; falls back to EUR converted at a fixed rate,
    /// rounded to cents; cards with no paper quote at all price at zero.
    #[must_use]
    pub fn reference_price(&self) -> Money {
        if let Some(usd) = self.usd.as_deref()
            && let Ok(price) = Money::parse(usd)
        {
            return price;
        }

        if let Some(eur) = self.eur.as_deref()
            && let Ok(amount) = Decimal::from_str(eur)
            && let Ok(price) = Money::from_decimal((amount * EUR_TO_USD).round_dp(2))
        {
            return price;
        }

        Money::ZERO
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_card_json() -> &'static str {
        r#"{
            "id": "f295b713-1d6a-43fd-910d-fb35414bf58a",
            "name": "Dusk // Dawn",
            "oracle_text": "Destroy all creatures with power 3 or greater.",
            "mana_cost": "{2}{W}{W}",
            "image_uris": { "normal": "https://cards.example/dusk.jpg" },
            "prices": { "usd": "0.83", "eur": "0.49" },
            "rarity": "rare"
        }"#
    }

    #[test]
    fn test_deserialize_and_map_full_card() {
        let card: ScryfallCard = serde_json::from_str(sample_card_json()).unwrap();
        let card = card.into_card();

        assert_eq!(card.id, "f295b713-1d6a-43fd-910d-fb35414bf58a");
        assert_eq!(card.name, "Dusk // Dawn");
        assert_eq!(card.mana_cost, "{2}{W}{W}");
        assert_eq!(card.image_url, "https://cards.example/dusk.jpg");
        assert_eq!(card.price.to_string(), "0.83");
        assert_eq!(card.rarity, "rare");
    }

    #[test]
    fn test_map_card_with_missing_fields() {
        let card: ScryfallCard =
            serde_json::from_str(r#"{ "id": "x", "name": "Island" }"#).unwrap();
        let card = card.into_card();

        // A card with no cost gets the empty cost symbol
        assert_eq!(card.mana_cost, "{}");
        assert_eq!(card.oracle_text, "");
        assert_eq!(card.image_url, "");
        assert_eq!(card.price, Money::ZERO);
    }

    #[test]
    fn test_empty_mana_cost_becomes_empty_braces() {
        let card: ScryfallCard =
            serde_json::from_str(r#"{ "id": "x", "name": "Island", "mana_cost": "" }"#).unwrap();
        assert_eq!(card.into_card().mana_cost, "{}");
    }

    #[test]
    fn test_price_falls_back_to_eur() {
        let prices = Prices {
            usd: None,
            eur: Some("1.00".to_owned()),
        };
        assert_eq!(prices.reference_price().to_string(), "1.08");
    }

    #[test]
    fn test_price_eur_rounds_to_cents() {
        let prices = Prices {
            usd: None,
            eur: Some("0.49".to_owned()),
        };
        // 0.49 * 1.08 = 0.5292 -> 0.53
        assert_eq!(prices.reference_price().to_string(), "0.53");
    }

    #[test]
    fn test_price_defaults_to_zero() {
        let prices = Prices {
            usd: None,
            eur: None,
        };
        assert_eq!(prices.reference_price(), Money::ZERO);
    }

    #[test]
    fn test_search_page_deserialize() {
        let page: SearchPage = serde_json::from_str(&format!(
            r#"{{ "total_cards": 1, "data": [{}] }}"#,
            sample_card_json()
        ))
        .unwrap();

        assert_eq!(page.total_cards, Some(1));
        assert_eq!(page.data.len(), 1);
    }
}
