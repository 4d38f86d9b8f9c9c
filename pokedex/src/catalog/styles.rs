// Category badge styles, shared by every view
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStyle {
    /// Tailwind classes for web front ends
    #[schema(value_type = String)]
    pub class: &'static str,
    /// Badge background
    #[schema(value_type = Vec<u8>)]
    pub rgb: (u8, u8, u8),
    /// Light backgrounds need dark text
    pub dark_text: bool,
}

const fn style(class: &'static str, rgb: (u8, u8, u8), dark_text: bool) -> CategoryStyle {
    CategoryStyle {
        class,
        rgb,
        dark_text,
    }
}

pub const DEFAULT_STYLE: CategoryStyle = style("bg-gray-500", (0x6b, 0x72, 0x80), false);

static CATEGORY_STYLES: phf::Map<&'static str, CategoryStyle> = phf::phf_map! {
    "grass" => style("bg-green-500", (0x22, 0xc5, 0x5e), false),
    "fire" => style("bg-red-500", (0xef, 0x44, 0x44), false),
    "water" => style("bg-blue-500", (0x3b, 0x82, 0xf6), false),
    "electric" => style("bg-yellow-400 text-black", (0xfa, 0xcc, 0x15), true),
    "poison" => style("bg-purple-600", (0x93, 0x33, 0xea), false),
    "flying" => style("bg-indigo-400", (0x81, 0x8c, 0xf8), false),
    "bug" => style("bg-lime-500", (0x84, 0xcc, 0x16), false),
    "normal" => style("bg-gray-400", (0x9c, 0xa3, 0xaf), false),
    "ground" => style("bg-yellow-700", (0xa1, 0x62, 0x07), false),
    "fairy" => style("bg-pink-400", (0xf4, 0x72, 0xb6), false),
    "fighting" => style("bg-orange-600", (0xea, 0x58, 0x0c), false),
    "psychic" => style("bg-pink-600", (0xdb, 0x27, 0x77), false),
    "rock" => style("bg-stone-600", (0x57, 0x53, 0x4e), false),
    "ghost" => style("bg-violet-700", (0x6d, 0x28, 0xd9), false),
    "ice" => style("bg-cyan-300 text-black", (0x67, 0xe8, 0xf9), true),
    "dragon" => style("bg-purple-800", (0x6b, 0x21, 0xa8), false),
    "dark" => style("bg-gray-700", (0x37, 0x41, 0x51), false),
    "steel" => style("bg-slate-400 text-black", (0x94, 0xa3, 0xb8), true),
};

/// Style for a category; unknown categories get [`DEFAULT_STYLE`]
pub fn category_style(category: &str) -> CategoryStyle {
    CATEGORY_STYLES
        .get(category)
        .copied()
        .unwrap_or(DEFAULT_STYLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_categories_have_distinct_classes() {
        assert_eq!(category_style("fire").class, "bg-red-500");
        assert_eq!(category_style("water").class, "bg-blue-500");
        assert!(category_style("electric").dark_text);
        assert!(!category_style("ghost").dark_text);
    }

    #[test]
    fn unknown_category_falls_back() {
        assert_eq!(category_style("shadow"), DEFAULT_STYLE);
        assert_eq!(category_style("Fire"), DEFAULT_STYLE);
    }
}
