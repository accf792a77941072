//! Stage 1: query analysis
//!
//! Normalizes the raw text query and extracts a structured search intent by
//! vocabulary match. No image involvement at this stage.

use crate::models::SearchIntent;

/// Clothing article vocabulary, canonical catalog spellings
const GARMENT_TYPES: &[&str] = &[
    "blazers",
    "boxers",
    "bra",
    "briefs",
    "camisoles",
    "capris",
    "churidar",
    "dresses",
    "dupatta",
    "jackets",
    "jeans",
    "jeggings",
    "jumpsuit",
    "kurtas",
    "kurtis",
    "leggings",
    "nightdress",
    "rompers",
    "sarees",
    "shapewear",
    "shirts",
    "shorts",
    "shrug",
    "skirts",
    "suits",
    "sweaters",
    "sweatshirts",
    "swimwear",
    "tights",
    "tops",
    "tracksuits",
    "trousers",
    "tshirts",
    "tunics",
    "waistcoat",
];

const COLORS: &[&str] = &[
    "black", "white", "red", "blue", "navy", "green", "yellow", "orange", "pink",
    "purple", "brown", "beige", "grey", "gray", "maroon", "olive", "cream",
    "gold", "silver", "teal", "turquoise", "lavender", "khaki", "burgundy",
];

/// Classify a query into structured search intent
pub fn analyze_query(raw_query: &str) -> SearchIntent {
    let tokens: Vec<String> = raw_query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();

    let mut intent = SearchIntent::default();

    for token in &tokens {
        if let Some(garment) = match_garment(token) {
            if !intent.garments.contains(&garment) {
                intent.garments.push(garment);
            }
            continue;
        }

        if COLORS.contains(&token.as_str()) {
            if !intent.colors.contains(token) {
                intent.colors.push(token.clone());
            }
            continue;
        }

        if intent.gender.is_none() {
            if let Some(gender) = match_gender(token) {
                intent.gender = Some(gender);
                continue;
            }
        }

        if intent.season.is_none() {
            if let Some(season) = match_season(token) {
                intent.season = Some(season);
                continue;
            }
        }

        if intent.usage.is_none() {
            if let Some(usage) = match_usage(token) {
                intent.usage = Some(usage);
                continue;
            }
        }

        if token.len() > 2 && !is_filler(token) && !intent.keywords.contains(token) {
            intent.keywords.push(token.clone());
        }
    }

    intent
}

/// Match a token against the garment vocabulary, tolerating singular forms
fn match_garment(token: &str) -> Option<String> {
    GARMENT_TYPES
        .iter()
        .find(|g| {
            let g = **g;
            token == g
                || format!("{token}s") == g
                || format!("{token}es") == g
                || format!("{g}s") == token
        })
        .map(|g| (*g).to_string())
}

fn match_gender(token: &str) -> Option<String> {
    match token {
        "men" | "man" | "male" | "mens" => Some("Men".to_string()),
        "women" | "woman" | "female" | "ladies" | "womens" => Some("Women".to_string()),
        "boys" | "boy" => Some("Boys".to_string()),
        "girls" | "girl" => Some("Girls".to_string()),
        "unisex" => Some("Unisex".to_string()),
        _ => None,
    }
}

fn match_season(token: &str) -> Option<String> {
    match token {
        "summer" => Some("Summer".to_string()),
        "winter" => Some("Winter".to_string()),
        "spring" => Some("Spring".to_string()),
        "fall" | "autumn" => Some("Fall".to_string()),
        _ => None,
    }
}

fn match_usage(token: &str) -> Option<String> {
    match token {
        "casual" => Some("Casual".to_string()),
        "formal" | "office" | "work" => Some("Formal".to_string()),
        "sports" | "sporty" | "athletic" | "workout" | "gym" | "running" => {
            Some("Sports".to_string())
        }
        "ethnic" | "traditional" | "festive" => Some("Ethnic".to_string()),
        "party" | "evening" => Some("Party".to_string()),
        _ => None,
    }
}

fn is_filler(token: &str) -> bool {
    matches!(
        token,
        "show" | "find" | "give" | "want" | "looking" | "for" | "the" | "and"
            | "with" | "some" | "something" | "any" | "nice" | "good" | "please"
            | "need" | "buy" | "get" | "recommend" | "suggest" | "similar"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summer_dresses() {
        let intent = analyze_query("Show me summer dresses");
        assert_eq!(intent.garments, vec!["dresses"]);
        assert_eq!(intent.season.as_deref(), Some("Summer"));
        assert!(intent.keywords.is_empty());
    }

    #[test]
    fn test_full_attribute_query() {
        let intent = analyze_query("blue casual shirts for men");
        assert_eq!(intent.garments, vec!["shirts"]);
        assert_eq!(intent.colors, vec!["blue"]);
        assert_eq!(intent.gender.as_deref(), Some("Men"));
        assert_eq!(intent.usage.as_deref(), Some("Casual"));
    }

    #[test]
    fn test_singular_garment_matches() {
        let intent = analyze_query("a red dress");
        assert_eq!(intent.garments, vec!["dresses"]);
        assert_eq!(intent.colors, vec!["red"]);
    }

    #[test]
    fn test_unmatched_terms_become_keywords() {
        let intent = analyze_query("floral wrap dress");
        assert_eq!(intent.garments, vec!["dresses"]);
        assert!(intent.keywords.contains(&"floral".to_string()));
        assert!(intent.keywords.contains(&"wrap".to_string()));
    }

    #[test]
    fn test_no_signal_query_yields_keywords_only() {
        let intent = analyze_query("something elegant");
        assert!(intent.garments.is_empty());
        assert_eq!(intent.keywords, vec!["elegant"]);
    }
}
