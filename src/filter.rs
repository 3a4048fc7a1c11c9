use serde::Serialize;

use crate::models::listing::Listing;

/// Purpose of a listing: rent or buy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Finalidade {
    Alugar,
    Comprar,
}

impl Finalidade {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "alugar" => Some(Finalidade::Alugar),
            "comprar" => Some(Finalidade::Comprar),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Finalidade::Alugar => "alugar",
            Finalidade::Comprar => "comprar",
        }
    }
}

/// Search criteria from the listing page form. Every field is optional;
/// an absent or empty field leaves its stage out.
#[derive(Debug, Clone, Default, PartialEq, FromForm, Serialize)]
pub struct ListingFilter {
    pub finalidade: Option<String>,
    pub tipo: Option<String>,
    pub cidade: Option<String>,
    pub quartos: Option<u32>,
    pub preco_min: Option<f64>,
    pub preco_max: Option<f64>,
}

fn non_empty(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ListingFilter {
    pub fn finalidade(&self) -> Option<Finalidade> {
        non_empty(&self.finalidade).and_then(Finalidade::parse)
    }

    pub fn is_empty(&self) -> bool {
        self.finalidade().is_none()
            && non_empty(&self.tipo).is_none()
            && non_empty(&self.cidade).is_none()
            && self.quartos.unwrap_or(0) == 0
            && self.preco_min.is_none()
            && self.preco_max.is_none()
    }

    /// True when `listing` survives every active stage.
    pub fn matches(&self, listing: &Listing) -> bool {
        // 1. Purpose
        match self.finalidade() {
            Some(Finalidade::Alugar) if !listing.preco.is_rent() => return false,
            Some(Finalidade::Comprar) if listing.preco.is_rent() => return false,
            _ => {}
        }

        // 2. Type
        if let Some(tipo) = non_empty(&self.tipo) {
            if listing.tipo.to_lowercase() != tipo.to_lowercase() {
                return false;
            }
        }

        // 3. City
        if let Some(cidade) = non_empty(&self.cidade) {
            if !listing
                .localizacao
                .to_lowercase()
                .contains(&cidade.to_lowercase())
            {
                return false;
            }
        }

        // 4. Bedrooms (zero means "any")
        if let Some(min) = self.quartos.filter(|q| *q > 0) {
            if listing.quartos < min {
                return false;
            }
        }

        // 5. Price range, on the bare amount: a monthly rent is compared
        // against the same bounds as a sale price.
        let amount = listing.preco.amount() as f64;
        if let Some(min) = self.preco_min.filter(|v| !v.is_nan()) {
            if amount < min {
                return false;
            }
        }
        if let Some(max) = self.preco_max.filter(|v| !v.is_nan()) {
            if amount > max {
                return false;
            }
        }

        true
    }

    /// Filtered copy, insertion order preserved.
    pub fn apply(&self, listings: &[Listing]) -> Vec<Listing> {
        listings
            .iter()
            .filter(|l| self.matches(l))
            .cloned()
            .collect()
    }
}

/// Grid or list presentation of the listing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Grade,
    Lista,
}

impl ViewMode {
    pub fn parse(s: Option<&str>) -> Self {
        match s.map(str::trim) {
            Some("lista") | Some("list") => ViewMode::Lista,
            _ => ViewMode::Grade,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Grade => "grade",
            ViewMode::Lista => "lista",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::listing::seed_listings;

    fn ids(listings: &[Listing]) -> Vec<i64> {
        listings.iter().map(|l| l.id).collect()
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let all = seed_listings();
        let filter = ListingFilter {
            tipo: Some("".into()),
            cidade: Some("  ".into()),
            quartos: Some(0),
            ..Default::default()
        };
        assert!(filter.is_empty());
        assert_eq!(ids(&filter.apply(&all)), vec![1, 2, 3]);
    }

    #[test]
    fn alugar_returns_only_rent() {
        let all = seed_listings();
        let filter = ListingFilter {
            finalidade: Some("alugar".into()),
            ..Default::default()
        };
        let out = filter.apply(&all);
        assert_eq!(ids(&out), vec![3]);
        assert!(out.iter().all(|l| l.preco.to_string().contains("/mês")));
    }

    #[test]
    fn comprar_excludes_rent() {
        let filter = ListingFilter {
            finalidade: Some("comprar".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&seed_listings())), vec![1, 2]);
    }

    #[test]
    fn unknown_finalidade_is_ignored() {
        let filter = ListingFilter {
            finalidade: Some("trocar".into()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&seed_listings()).len(), 3);
    }

    #[test]
    fn tipo_is_case_insensitive_exact() {
        let filter = ListingFilter {
            tipo: Some("casa".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&seed_listings())), vec![2]);

        let partial = ListingFilter {
            tipo: Some("Cas".into()),
            ..Default::default()
        };
        assert!(partial.apply(&seed_listings()).is_empty());
    }

    #[test]
    fn cidade_is_substring() {
        let filter = ListingFilter {
            cidade: Some(" financeiro ".into()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&seed_listings())), vec![3]);
    }

    #[test]
    fn quartos_is_minimum() {
        let filter = ListingFilter {
            quartos: Some(4),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&seed_listings())), vec![2]);
    }

    #[test]
    fn price_range_is_inclusive_on_bare_amount() {
        let filter = ListingFilter {
            preco_min: Some(900_000.0),
            preco_max: Some(1_300_000.0),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&seed_listings())), vec![1, 2]);

        let exact = ListingFilter {
            preco_min: Some(980_000.0),
            preco_max: Some(980_000.0),
            ..Default::default()
        };
        assert_eq!(ids(&exact.apply(&seed_listings())), vec![2]);
    }

    #[test]
    fn rent_amount_is_compared_as_bare_number() {
        let filter = ListingFilter {
            preco_max: Some(6_000.0),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&seed_listings())), vec![3]);
    }

    #[test]
    fn stages_compose() {
        let filter = ListingFilter {
            finalidade: Some("comprar".into()),
            cidade: Some("cidade exemplo".into()),
            quartos: Some(3),
            preco_max: Some(1_000_000.0),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&seed_listings())), vec![2]);
    }

    #[test]
    fn view_mode_defaults_to_grid() {
        assert_eq!(ViewMode::parse(None), ViewMode::Grade);
        assert_eq!(ViewMode::parse(Some("lista")), ViewMode::Lista);
        assert_eq!(ViewMode::parse(Some("qualquer")), ViewMode::Grade);
    }
}
