//! Configured source descriptors: the universe of cities the pipeline
//! knows about. Read-only; loaded once at startup.

use crate::types::SourceDescriptor;

fn source(
    id: &str,
    city_name: &str,
    country: &str,
    region: &str,
    url: &str,
    scraped_date: &str,
    currency: Option<&str>,
) -> SourceDescriptor {
    SourceDescriptor {
        id: id.to_string(),
        city_name: city_name.to_string(),
        country: country.to_string(),
        region: region.to_string(),
        url: url.to_string(),
        scraped_date: scraped_date.to_string(),
        currency: currency.map(|c| c.to_string()),
    }
}

/// All configured city datasets (gzipped listings.csv exports).
pub fn data_sources() -> Vec<SourceDescriptor> {
    vec![
        source(
            "amsterdam",
            "Amsterdam",
            "Netherlands",
            "Europe",
            "https://data.insideairbnb.com/the-netherlands/north-holland/amsterdam/2024-09-05/data/listings.csv.gz",
            "2024-09-05",
            Some("EUR"),
        ),
        source(
            "athens",
            "Athens",
            "Greece",
            "Europe",
            "https://data.insideairbnb.com/greece/attica/athens/2024-09-21/data/listings.csv.gz",
            "2024-09-21",
            Some("EUR"),
        ),
        source(
            "austin",
            "Austin",
            "United States",
            "North America",
            "https://data.insideairbnb.com/united-states/tx/austin/2024-09-12/data/listings.csv.gz",
            "2024-09-12",
            None,
        ),
        source(
            "bangkok",
            "Bangkok",
            "Thailand",
            "Asia",
            "https://data.insideairbnb.com/thailand/central-thailand/bangkok/2024-09-25/data/listings.csv.gz",
            "2024-09-25",
            Some("THB"),
        ),
        source(
            "barcelona",
            "Barcelona",
            "Spain",
            "Europe",
            "https://data.insideairbnb.com/spain/catalonia/barcelona/2024-09-06/data/listings.csv.gz",
            "2024-09-06",
            Some("EUR"),
        ),
        source(
            "berlin",
            "Berlin",
            "Germany",
            "Europe",
            "https://data.insideairbnb.com/germany/be/berlin/2024-09-21/data/listings.csv.gz",
            "2024-09-21",
            Some("EUR"),
        ),
        source(
            "budapest",
            "Budapest",
            "Hungary",
            "Europe",
            "https://data.insideairbnb.com/hungary/k%C3%B6z%C3%A9p-magyarorsz%C3%A1g/budapest/2024-09-20/data/listings.csv.gz",
            "2024-09-20",
            Some("HUF"),
        ),
        source(
            "buenos-aires",
            "Buenos Aires",
            "Argentina",
            "South America",
            "https://data.insideairbnb.com/argentina/ciudad-aut%C3%B3noma-de-buenos-aires/buenos-aires/2024-09-27/data/listings.csv.gz",
            "2024-09-27",
            Some("ARS"),
        ),
        source(
            "copenhagen",
            "Copenhagen",
            "Denmark",
            "Europe",
            "https://data.insideairbnb.com/denmark/hovedstaden/copenhagen/2024-09-28/data/listings.csv.gz",
            "2024-09-28",
            Some("DKK"),
        ),
        source(
            "lisbon",
            "Lisbon",
            "Portugal",
            "Europe",
            "https://data.insideairbnb.com/portugal/lisbon/lisbon/2024-09-13/data/listings.csv.gz",
            "2024-09-13",
            Some("EUR"),
        ),
        source(
            "london",
            "London",
            "United Kingdom",
            "Europe",
            "https://data.insideairbnb.com/united-kingdom/england/london/2024-09-06/data/listings.csv.gz",
            "2024-09-06",
            Some("GBP"),
        ),
        source(
            "mexico-city",
            "Mexico City",
            "Mexico",
            "North America",
            "https://data.insideairbnb.com/mexico/df/mexico-city/2024-09-25/data/listings.csv.gz",
            "2024-09-25",
            Some("MXN"),
        ),
        source(
            "new-york-city",
            "New York City",
            "United States",
            "North America",
            "https://data.insideairbnb.com/united-states/ny/new-york-city/2024-09-04/data/listings.csv.gz",
            "2024-09-04",
            None,
        ),
        source(
            "prague",
            "Prague",
            "Czech Republic",
            "Europe",
            "https://data.insideairbnb.com/czech-republic/prague/prague/2024-09-20/data/listings.csv.gz",
            "2024-09-20",
            Some("CZK"),
        ),
        source(
            "sydney",
            "Sydney",
            "Australia",
            "Oceania",
            "https://data.insideairbnb.com/australia/nsw/sydney/2024-09-07/data/listings.csv.gz",
            "2024-09-07",
            Some("AUD"),
        ),
        source(
            "tokyo",
            "Tokyo",
            "Japan",
            "Asia",
            "https://data.insideairbnb.com/japan/kant%C5%8D/tokyo/2024-09-28/data/listings.csv.gz",
            "2024-09-28",
            Some("JPY"),
        ),
        source(
            "vancouver",
            "Vancouver",
            "Canada",
            "North America",
            "https://data.insideairbnb.com/canada/bc/vancouver/2024-09-07/data/listings.csv.gz",
            "2024-09-07",
            Some("CAD"),
        ),
        source(
            "vienna",
            "Vienna",
            "Austria",
            "Europe",
            "https://data.insideairbnb.com/austria/vienna/vienna/2024-09-12/data/listings.csv.gz",
            "2024-09-12",
            Some("EUR"),
        ),
    ]
}

/// Look up one configured source by id.
pub fn find_source(id: &str) -> Option<SourceDescriptor> {
    data_sources().into_iter().find(|s| s.id == id)
}
