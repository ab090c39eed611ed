//! Shared fixtures for unit tests.

/// A small but complete blueprint for the `cat_content` component
pub const CATALOG_BLUEPRINT: &str = r#"{
    "name": "Cat Content",
    "profile": "core",
    "description": "Owns cat listings and their publication lifecycle",
    "actors": [{ "name": "Visitor", "description": "Browses public cats" }],
    "relationships": {
        "publishes_to": [{ "bc": "search", "via": "EventBus", "events": ["CatListingPublished"] }],
        "consumed_by": [{ "bc": "analytics", "purpose": "reporting" }]
    },
    "layers": {
        "domain": {
            "aggregates": [{
                "name": "CatListing",
                "key_attributes": ["id", "slug"],
                "invariants": ["slug is unique"],
                "lifecycle": ["draft", "published"]
            }],
            "events": [{ "name": "CatListingPublished", "payload_intent": ["id", "slug"] }],
            "ports": { "repositories": ["CatListingRepository"], "external": [] }
        },
        "application": {
            "services": [{
                "name": "CatListingService",
                "orchestrates": "CatListing",
                "uses_ports": ["CatListingRepository"]
            }],
            "capabilities": [{
                "name": "Browse Catalog",
                "actors": ["Visitor"],
                "entrypoints": ["CatalogController#index"],
                "orchestrates": ["CatListingService"],
                "uses_ports": ["CatListingRepository"],
                "emits": [],
                "outputs": ["PaginatedResult"]
            }]
        },
        "infrastructure": {
            "adapters": {
                "persistence": [{ "name": "SqlCatListingRepository", "implements": "CatListingRepository", "technology": "PostgreSQL" }],
                "external": []
            },
            "entrypoints": { "http": [{ "name": "CatalogController", "routes": "GET /catalog" }] }
        }
    },
    "external_systems": [{ "name": "PostgreSQL", "type": "database", "description": "Primary persistence" }]
}"#;
