use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Image shown when a listing has no photo of its own.
pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.jpg";

/// True for the placeholder, including the relative form older records stored.
pub fn is_placeholder(src: &str) -> bool {
    src.trim().trim_start_matches('/') == PLACEHOLDER_IMAGE.trim_start_matches('/')
}

/// Marker that turns a stored price string into a monthly rent.
pub const RENT_SUFFIX: &str = "/mês";

/// Asking price. Stored as a string, `"1250000"` for sale or `"5500/mês"` for rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preco {
    Sale(u64),
    Rent(u64),
}

impl Preco {
    /// Bare amount with the purpose discarded.
    pub fn amount(&self) -> u64 {
        match self {
            Preco::Sale(v) | Preco::Rent(v) => *v,
        }
    }

    pub fn is_rent(&self) -> bool {
        matches!(self, Preco::Rent(_))
    }
}

impl FromStr for Preco {
    type Err = std::convert::Infallible;

    /// Never fails: a string without digits is a zero amount.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
        let amount = digits.parse::<u64>().unwrap_or(0);
        if s.contains(RENT_SUFFIX) {
            Ok(Preco::Rent(amount))
        } else {
            Ok(Preco::Sale(amount))
        }
    }
}

impl fmt::Display for Preco {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preco::Sale(v) => write!(f, "{}", v),
            Preco::Rent(v) => write!(f, "{}{}", v, RENT_SUFFIX),
        }
    }
}

impl Default for Preco {
    fn default() -> Self {
        Preco::Sale(0)
    }
}

impl Serialize for Preco {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Text(String),
    Int(u64),
    Float(f64),
}

impl<'de> Deserialize<'de> for Preco {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawScalar::deserialize(deserializer)? {
            RawScalar::Text(s) => s.parse().unwrap_or_default(),
            RawScalar::Int(v) => Preco::Sale(v),
            RawScalar::Float(v) => Preco::Sale(v.max(0.0) as u64),
        })
    }
}

/// Parse a free-form count. Anything non-numeric or negative counts as zero.
pub fn parse_count(s: &str) -> u32 {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(|v| v as u32)
        .unwrap_or(0)
}

/// Counts are persisted as strings (`"3"`) and read back from strings or numbers.
mod count_string {
    use super::{parse_count, RawScalar};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        Ok(match RawScalar::deserialize(deserializer)? {
            RawScalar::Text(s) => parse_count(&s),
            RawScalar::Int(v) => u32::try_from(v).unwrap_or(u32::MAX),
            RawScalar::Float(v) if v > 0.0 => v as u32,
            RawScalar::Float(_) => 0,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coords {
    pub lat: f64,
    pub lon: f64,
}

impl Coords {
    /// A zero on either axis means "no position recorded".
    pub fn is_set(&self) -> bool {
        self.lat != 0.0 && self.lon != 0.0
    }
}

/// A real-estate listing ("imóvel").
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Listing {
    pub id: i64,
    pub titulo: String,
    pub preco: Preco,
    pub localizacao: String,
    pub tipo: String,
    #[serde(with = "count_string", default)]
    pub quartos: u32,
    #[serde(with = "count_string", default)]
    pub banheiros: u32,
    #[serde(with = "count_string", default)]
    pub vagas: u32,
    #[serde(with = "count_string", default)]
    pub area: u32,
    #[serde(default)]
    pub imagem: String,
    #[serde(default)]
    pub imagens: Vec<String>,
    #[serde(default)]
    pub descricao: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<Coords>,
    /// Stored keys this model does not know about, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fields submitted by the admin form. Absent optional fields leave the
/// stored value untouched on merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingDraft {
    pub titulo: String,
    pub preco: Preco,
    pub localizacao: String,
    pub tipo: String,
    pub quartos: u32,
    pub banheiros: u32,
    pub vagas: u32,
    pub area: u32,
    pub imagens: Vec<String>,
    pub descricao: String,
    pub coords: Option<Coords>,
}

impl ListingDraft {
    /// Primary image: the first of `imagens`, or the placeholder.
    pub fn primary_image(&self) -> String {
        self.imagens
            .first()
            .cloned()
            .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())
    }

    pub fn into_listing(self, id: i64) -> Listing {
        let imagem = self.primary_image();
        Listing {
            id,
            titulo: self.titulo,
            preco: self.preco,
            localizacao: self.localizacao,
            tipo: self.tipo,
            quartos: self.quartos,
            banheiros: self.banheiros,
            vagas: self.vagas,
            area: self.area,
            imagem,
            imagens: self.imagens,
            descricao: self.descricao,
            coords: self.coords,
            extra: Map::new(),
        }
    }
}

impl Listing {
    /// Full-record replace of the submitted fields; `id` and unknown keys never change.
    pub fn merge(&mut self, draft: ListingDraft) {
        self.imagem = draft.primary_image();
        self.titulo = draft.titulo;
        self.preco = draft.preco;
        self.localizacao = draft.localizacao;
        self.tipo = draft.tipo;
        self.quartos = draft.quartos;
        self.banheiros = draft.banheiros;
        self.vagas = draft.vagas;
        self.area = draft.area;
        self.imagens = draft.imagens;
        self.descricao = draft.descricao;
        if let Some(coords) = draft.coords {
            self.coords = Some(coords);
        }
    }

    /// Every stored photo, falling back to the primary image. The placeholder
    /// is not a photo.
    pub fn images(&self) -> Vec<&str> {
        let photos: Vec<&str> = if !self.imagens.is_empty() {
            self.imagens.iter().map(String::as_str).collect()
        } else if !self.imagem.is_empty() {
            vec![self.imagem.as_str()]
        } else {
            Vec::new()
        };
        photos.into_iter().filter(|src| !is_placeholder(src)).collect()
    }

    pub fn image_or_placeholder(&self) -> &str {
        if self.imagem.is_empty() || is_placeholder(&self.imagem) {
            PLACEHOLDER_IMAGE
        } else {
            &self.imagem
        }
    }

    pub fn to_draft(&self) -> ListingDraft {
        ListingDraft {
            titulo: self.titulo.clone(),
            preco: self.preco,
            localizacao: self.localizacao.clone(),
            tipo: self.tipo.clone(),
            quartos: self.quartos,
            banheiros: self.banheiros,
            vagas: self.vagas,
            area: self.area,
            imagens: self.images().into_iter().map(String::from).collect(),
            descricao: self.descricao.clone(),
            coords: self.coords,
        }
    }
}

/// Sample records installed on first load.
pub fn seed_listings() -> Vec<Listing> {
    vec![
        Listing {
            id: 1,
            titulo: "Apartamento Moderno no Coração da Cidade".into(),
            preco: Preco::Sale(1_250_000),
            localizacao: "Centro, Cidade Exemplo".into(),
            tipo: "Apartamento".into(),
            quartos: 3,
            banheiros: 2,
            vagas: 2,
            area: 120,
            imagem: "https://images.pexels.com/photos/276724/pexels-photo-276724.jpeg?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=1".into(),
            imagens: Vec::new(),
            descricao: "Este apartamento espaçoso e moderno está localizado no coração da cidade, oferecendo acesso fácil a todas as comodidades. Com acabamentos de alta qualidade, uma cozinha gourmet e uma vista deslumbrante da cidade, é o lugar perfeito para quem busca conforto e conveniência.".into(),
            coords: None,
            extra: Map::new(),
        },
        Listing {
            id: 2,
            titulo: "Casa de Família com Quintal Amplo".into(),
            preco: Preco::Sale(980_000),
            localizacao: "Bairro Residencial, Cidade Exemplo".into(),
            tipo: "Casa".into(),
            quartos: 4,
            banheiros: 3,
            vagas: 3,
            area: 250,
            imagem: "https://images.pexels.com/photos/106399/pexels-photo-106399.jpeg?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=1".into(),
            imagens: Vec::new(),
            descricao: "Uma casa encantadora, ideal para famílias, localizada em um bairro tranquilo e arborizado. Possui um quintal grande com espaço para piscina e área de lazer. Os interiores são arejados e bem iluminados, com uma suíte master e quartos espaçosos.".into(),
            coords: None,
            extra: Map::new(),
        },
        Listing {
            id: 3,
            titulo: "Escritório Comercial em Localização Estratégica".into(),
            preco: Preco::Rent(5_500),
            localizacao: "Distrito Financeiro, Cidade Exemplo".into(),
            tipo: "Comercial".into(),
            quartos: 0,
            banheiros: 2,
            vagas: 5,
            area: 200,
            imagem: "https://images.pexels.com/photos/269077/pexels-photo-269077.jpeg?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=1".into(),
            imagens: Vec::new(),
            descricao: "Sala comercial moderna e espaçosa, perfeita para empresas que buscam uma localização de prestígio. O edifício oferece segurança 24 horas, estacionamento para clientes e uma infraestrutura completa para o seu negócio prosperar.".into(),
            coords: None,
            extra: Map::new(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preco_suffix_selects_rent() {
        assert_eq!("5500/mês".parse::<Preco>().unwrap(), Preco::Rent(5500));
        assert_eq!("1250000".parse::<Preco>().unwrap(), Preco::Sale(1_250_000));
        assert_eq!("R$ 980.000".parse::<Preco>().unwrap(), Preco::Sale(980_000));
        assert_eq!("".parse::<Preco>().unwrap(), Preco::Sale(0));
        assert_eq!(
            "5500/mês + condomínio".parse::<Preco>().unwrap(),
            Preco::Rent(5500)
        );
    }

    #[test]
    fn preco_keeps_stored_string_shape() {
        assert_eq!(serde_json::to_string(&Preco::Rent(5500)).unwrap(), "\"5500/mês\"");
        assert_eq!(serde_json::to_string(&Preco::Sale(10)).unwrap(), "\"10\"");
        let p: Preco = serde_json::from_str("750000").unwrap();
        assert_eq!(p, Preco::Sale(750_000));
    }

    #[test]
    fn counts_read_from_strings_or_numbers() {
        let json = r#"{"id":7,"titulo":"t","preco":"1","localizacao":"l","tipo":"Casa",
            "quartos":"3","banheiros":2,"vagas":"x","area":"85.5"}"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.quartos, 3);
        assert_eq!(listing.banheiros, 2);
        assert_eq!(listing.vagas, 0);
        assert_eq!(listing.area, 85);
        assert!(listing.imagens.is_empty());
        assert!(listing.coords.is_none());

        let out = serde_json::to_value(&listing).unwrap();
        assert_eq!(out["quartos"], "3");
        assert_eq!(out["preco"], "1");
    }

    #[test]
    fn draft_primary_image_matches_first_photo() {
        let draft = ListingDraft {
            imagens: vec!["a.jpg".into(), "b.jpg".into()],
            ..Default::default()
        };
        let listing = draft.into_listing(9);
        assert_eq!(listing.imagem, "a.jpg");
        assert_eq!(listing.imagens[0], listing.imagem);

        let empty = ListingDraft::default().into_listing(10);
        assert_eq!(empty.imagem, PLACEHOLDER_IMAGE);
        assert!(empty.imagens.is_empty());
    }

    #[test]
    fn merge_keeps_coords_when_absent() {
        let mut listing = seed_listings().remove(0);
        listing.coords = Some(Coords { lat: -23.5, lon: -46.6 });

        let mut draft = listing.to_draft();
        draft.titulo = "Novo título".into();
        draft.coords = None;
        listing.merge(draft);

        assert_eq!(listing.id, 1);
        assert_eq!(listing.titulo, "Novo título");
        assert_eq!(listing.coords, Some(Coords { lat: -23.5, lon: -46.6 }));
        assert_eq!(listing.imagens[0], listing.imagem);
    }

    #[test]
    fn images_fall_back_to_primary() {
        let listing = seed_listings().remove(1);
        assert_eq!(listing.images(), vec![listing.imagem.as_str()]);
    }

    #[test]
    fn placeholder_is_not_a_photo() {
        let listing = ListingDraft::default().into_listing(4);
        assert!(listing.images().is_empty());
        assert!(listing.to_draft().imagens.is_empty());

        let mut legacy = listing.clone();
        legacy.imagem = "images/placeholder.jpg".into();
        assert!(legacy.images().is_empty());
        assert_eq!(legacy.image_or_placeholder(), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn unknown_keys_survive_merge_and_reserialize() {
        let json = r#"{"id":1,"titulo":"t","preco":"1","localizacao":"l","tipo":"Casa",
            "destaque":true,"corretor":{"nome":"Ana"}}"#;
        let mut listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.extra["destaque"], true);

        let mut draft = listing.to_draft();
        draft.titulo = "Outro".into();
        listing.merge(draft);

        let out = serde_json::to_value(&listing).unwrap();
        assert_eq!(out["titulo"], "Outro");
        assert_eq!(out["destaque"], true);
        assert_eq!(out["corretor"]["nome"], "Ana");
    }
}
