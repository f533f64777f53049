//! Directory of bookable experts.

use varun_server_models::Expert;

struct ExpertEntry {
    id: &'static str,
    name: &'static str,
    specialization: &'static str,
    experience: &'static str,
    rating: f64,
    reviews: u32,
    availability: &'static str,
}

const EXPERTS: &[ExpertEntry] = &[
    ExpertEntry {
        id: "rajesh-kumar",
        name: "Dr. Rajesh Kumar",
        specialization: "Rainwater Harvesting Expert",
        experience: "15+ years",
        rating: 4.8,
        reviews: 124,
        availability: "Available",
    },
    ExpertEntry {
        id: "priya-sharma",
        name: "Priya Sharma",
        specialization: "Civil Engineer",
        experience: "10+ years",
        rating: 4.9,
        reviews: 89,
        availability: "Available",
    },
    ExpertEntry {
        id: "arun-menon",
        name: "Arun Menon",
        specialization: "Groundwater Specialist",
        experience: "12+ years",
        rating: 4.7,
        reviews: 156,
        availability: "Busy",
    },
];

impl From<&ExpertEntry> for Expert {
    fn from(entry: &ExpertEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            name: entry.name.to_string(),
            specialization: entry.specialization.to_string(),
            experience: entry.experience.to_string(),
            rating: entry.rating,
            reviews: entry.reviews,
            availability: entry.availability.to_string(),
        }
    }
}

/// All experts, in display order.
#[must_use]
pub fn all_experts() -> Vec<Expert> {
    EXPERTS.iter().map(Expert::from).collect()
}

/// Looks up an expert by ID.
#[must_use]
pub fn find_expert(id: &str) -> Option<Expert> {
    EXPERTS.iter().find(|e| e.id == id).map(Expert::from)
}
