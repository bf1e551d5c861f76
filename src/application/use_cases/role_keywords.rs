// Centralized header keyword configuration for column role detection.
//
// Keywords are matched against a normalized header (lowercase, accents
// folded, space/dash/dot -> underscore).

use crate::domain::sales::ColumnRole;

/// Score when the header equals a keyword.
pub const EXACT_MATCH_SCORE: f32 = 1.0;
/// Score when the keyword is a whole `_`-delimited token of the header.
pub const TOKEN_MATCH_SCORE: f32 = 0.85;
/// Score when the keyword only appears inside the header.
pub const SUBSTRING_MATCH_SCORE: f32 = 0.6;
/// Multiplier applied to weak keywords.
pub const WEAK_KEYWORD_FACTOR: f32 = 0.7;

/// Keyword lists for one role
pub struct RoleKeywords {
    pub role: ColumnRole,
    pub strong: &'static [&'static str],
    pub weak: &'static [&'static str],
}

pub const ROLE_KEYWORDS: &[RoleKeywords] = &[
    RoleKeywords {
        role: ColumnRole::Sales,
        strong: &[
            "sales", "sale", "revenue", "revenues", "amount", "turnover", "venta", "ventas",
            "ingreso", "ingresos", "monto", "importe", "facturacion",
        ],
        weak: &["total", "price", "precio", "value", "valor", "subtotal"],
    },
    RoleKeywords {
        role: ColumnRole::Product,
        strong: &[
            "product", "products", "producto", "productos", "item", "items", "articulo",
            "articulos", "sku",
        ],
        weak: &["article", "model", "modelo", "category", "categoria", "description"],
    },
    RoleKeywords {
        role: ColumnRole::Customer,
        strong: &[
            "customer", "customers", "client", "clients", "cliente", "clientes", "buyer",
            "comprador", "account",
        ],
        weak: &["company", "empresa", "name", "nombre"],
    },
    RoleKeywords {
        role: ColumnRole::Region,
        strong: &[
            "region", "regions", "country", "pais", "city", "ciudad", "state", "estado",
            "province", "provincia", "territory", "zona", "zone", "market",
        ],
        weak: &["location", "ubicacion", "area", "store", "tienda", "branch", "sucursal"],
    },
    RoleKeywords {
        role: ColumnRole::Date,
        strong: &["date", "fecha", "day", "dia", "timestamp", "created_at", "order_date"],
        weak: &["time", "tiempo", "period", "periodo", "month", "mes"],
    },
    RoleKeywords {
        role: ColumnRole::Quantity,
        strong: &[
            "quantity", "qty", "units", "unidades", "cantidad", "volume", "volumen", "pieces",
            "piezas",
        ],
        weak: &["count", "number", "numero"],
    },
    RoleKeywords {
        role: ColumnRole::Discount,
        strong: &["discount", "discounts", "descuento", "descuentos", "rebate", "markdown"],
        weak: &["promo", "promotion", "promocion"],
    },
    RoleKeywords {
        role: ColumnRole::ShippingMethod,
        strong: &[
            "ship_mode", "shipping", "shipment", "envio", "delivery", "entrega", "carrier",
            "transportista",
        ],
        weak: &["ship", "mode", "modo", "channel", "canal"],
    },
    RoleKeywords {
        role: ColumnRole::Profit,
        strong: &[
            "profit", "profits", "margin", "ganancia", "ganancias", "margen", "utilidad",
            "beneficio", "earnings",
        ],
        weak: &["net", "neto"],
    },
];

/// Header tokens that mark identifiers; such columns never get a role
/// from their values alone.
pub const IDENTIFIER_TOKENS: &[&str] = &[
    "id", "uuid", "code", "codigo", "zip", "postal", "cp", "phone", "telefono", "email",
    "row", "index", "year", "ano",
];

/// Header tokens of free-form commentary columns; short values there say
/// nothing about the role either.
pub const FREE_TEXT_TOKENS: &[&str] = &[
    "note", "notes", "nota", "notas", "comment", "comments", "comentario", "comentarios",
    "observacion", "observaciones", "remark", "remarks",
];

pub fn normalize_header(s: &str) -> String {
    s.trim()
        .trim_matches('"')
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .map(|c| match c {
            ' ' | '-' | '.' | '/' => '_',
            other => other,
        })
        .collect::<String>()
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Score how well a normalized header matches a keyword (0.0 when it
/// does not match at all).
pub fn keyword_match_score(normalized_header: &str, keyword: &str) -> f32 {
    if normalized_header == keyword {
        return EXACT_MATCH_SCORE;
    }
    if normalized_header.ends_with(&format!("_{}", keyword))
        || normalized_header.starts_with(&format!("{}_", keyword))
        || normalized_header.contains(&format!("_{}_", keyword))
    {
        return TOKEN_MATCH_SCORE;
    }
    if keyword.len() >= 4 && normalized_header.contains(keyword) {
        return SUBSTRING_MATCH_SCORE;
    }
    0.0
}

/// Best name score for a role over its keyword lists.
pub fn name_score(normalized_header: &str, keywords: &RoleKeywords) -> f32 {
    let strong = keywords
        .strong
        .iter()
        .map(|k| keyword_match_score(normalized_header, k))
        .fold(0.0f32, f32::max);
    let weak = keywords
        .weak
        .iter()
        .map(|k| keyword_match_score(normalized_header, k) * WEAK_KEYWORD_FACTOR)
        .fold(0.0f32, f32::max);
    strong.max(weak)
}

fn has_token(normalized_header: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|token| {
        normalized_header == *token
            || normalized_header.ends_with(&format!("_{}", token))
            || normalized_header.starts_with(&format!("{}_", token))
    })
}

pub fn is_identifier_header(normalized_header: &str) -> bool {
    has_token(normalized_header, IDENTIFIER_TOKENS)
}

pub fn is_free_text_header(normalized_header: &str) -> bool {
    has_token(normalized_header, FREE_TEXT_TOKENS)
}
