//! Built-in product catalog for the showcase.
//!
//! The surrounding commerce system owns product records; the showcase only
//! needs the display/asset fields below. Descriptors are static so a
//! `Product` can be handed around by reference for the life of the process.

use crate::models::{Product, ProductPhase, ProductSpec, TextAlignment, Visuals};

static UMBRA_ONE_SPECS: &[ProductSpec] = &[
    ProductSpec { label: "LAYOUT", value: "65%" },
    ProductSpec { label: "SWITCH", value: "TACTILE" },
    ProductSpec { label: "MATERIAL", value: "ALUMINUM" },
    ProductSpec { label: "ACTUATION", value: "45G" },
    ProductSpec { label: "CONNECTIVITY", value: "TRI-MODE" },
];

static UMBRA_ONE_PHASES: &[ProductPhase] = &[
    ProductPhase {
        title: "ZERO GRAVITY",
        subtitle: "MOUNTING",
        description: "GASKET-SUSPENDED PLATE ISOLATES EVERY KEYSTROKE.",
    },
    ProductPhase {
        title: "ACOUSTIC",
        subtitle: "PERFECTION",
        description: "LAYERED DAMPENING TUNED FOR DEPTH.",
    },
    ProductPhase {
        title: "READY?",
        subtitle: "ASSEMBLE",
        description: "BUILD YOURS.",
    },
];

static UMBRA_CARBON_SPECS: &[ProductSpec] = &[
    ProductSpec { label: "MATERIAL", value: "FORGED CARBON" },
    ProductSpec { label: "DRIVERS", value: "50MM GRAPHENE" },
    ProductSpec { label: "FREQ RESP", value: "10HZ - 40KHZ" },
    ProductSpec { label: "BATTERY", value: "80 HOURS" },
    ProductSpec { label: "WEIGHT", value: "240G" },
];

static UMBRA_CARBON_PHASES: &[ProductPhase] = &[
    ProductPhase {
        title: "THE CHASSIS",
        subtitle: "FORGED CARBON",
        description: "LIGHTER THAN TITANIUM. MATTE BLACK ABSORBS LIGHT.",
    },
    ProductPhase {
        title: "THE INTERNALS",
        subtitle: "50MM GRAPHENE",
        description: "DISTORTION-FREE DIAPHRAGMS FOR SURGICAL CLARITY.",
    },
    ProductPhase {
        title: "CONNECTIVITY",
        subtitle: "LOW LATENCY",
        description: "WIRED-GRADE SPEED WITHOUT THE WIRE.",
    },
];

static CATALOG: &[Product] = &[
    Product {
        id: "umbra-one",
        name: "UMBRA ONE",
        hero_name: "UMBRA",
        model_name: "ONE",
        tagline: "THE ORIGINAL.",
        sub_headline: "PRECISION ENGINEERED GASKET MOUNT. ACOUSTIC PERFECTION.",
        price: 299,
        folder: "assets/umbra-one",
        file_extension: "webp",
        frame_count: 218,
        accent_color: "#00F0FF",
        specs: UMBRA_ONE_SPECS,
        phases: UMBRA_ONE_PHASES,
        visuals: Visuals {
            scale: 0.95,
            y_offset: 0.0,
            text_alignment: TextAlignment::Left,
        },
    },
    Product {
        id: "umbra-carbon",
        name: "UMBRA CARBON",
        hero_name: "UMBRA",
        model_name: "CARBON",
        tagline: "FORGED IN SHADOW.",
        sub_headline: "FORGED CARBON FIBER CHASSIS. LIGHTWEIGHT. INDESTRUCTIBLE.",
        price: 349,
        folder: "assets/umbra-carbon",
        file_extension: "webp",
        frame_count: 120,
        accent_color: "#10B981",
        specs: UMBRA_CARBON_SPECS,
        phases: UMBRA_CARBON_PHASES,
        visuals: Visuals {
            scale: 1.0,
            y_offset: 0.05,
            text_alignment: TextAlignment::Left,
        },
    },
];

pub fn catalog() -> &'static [Product] {
    CATALOG
}

pub fn find(id: &str) -> Option<&'static Product> {
    CATALOG.iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_entries_are_well_formed() {
        for product in catalog() {
            assert!(product.frame_count > 0, "{} has no frames", product.id);
            assert!(!product.folder.is_empty());
            assert!(product.visuals.scale >= 0.0);
            assert!((-1.0..=1.0).contains(&product.visuals.y_offset));
        }
    }

    #[test]
    fn descriptors_copy_by_value_out_of_the_catalog() {
        let product = find("umbra-one").unwrap();
        let owned: Product = *product;
        assert_eq!(owned.id, product.id);
        assert_eq!(owned.frame_count, product.frame_count);
    }

    #[test]
    fn find_by_id() {
        assert!(find("umbra-one").is_some());
        assert!(find("umbra-one-mk2").is_none());
    }
}
