use std::fmt;

use serde::{Deserialize, Serialize};

use crate::workflows::scope::ScopeIndicator;

/// Contracting divisions a job is scored for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Division {
    ErwRetainingWalls,
    KaufmanConcrete,
    LandtecLandscape,
    RatliffHardscape,
}

impl Division {
    pub const ALL: [Division; 4] = [
        Division::ErwRetainingWalls,
        Division::KaufmanConcrete,
        Division::LandtecLandscape,
        Division::RatliffHardscape,
    ];

    /// Key used for the division in the model response.
    pub const fn key(self) -> &'static str {
        match self {
            Division::ErwRetainingWalls => "erw_retaining_walls",
            Division::KaufmanConcrete => "kaufman_concrete",
            Division::LandtecLandscape => "landtec_landscape",
            Division::RatliffHardscape => "ratliff_hardscape",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Division::ErwRetainingWalls => "ERW Retaining Walls",
            Division::KaufmanConcrete => "Kaufman Concrete",
            Division::LandtecLandscape => "Landtec Landscape",
            Division::RatliffHardscape => "Ratliff Hardscape",
        }
    }
}

impl fmt::Display for Division {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a division looks for in the scope data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivisionProfile {
    pub division: Division,
    pub indicators: Vec<ScopeIndicator>,
    pub keywords: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreBand {
    pub level: u8,
    pub description: &'static str,
}

/// Scoring guidance handed to the model with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rubric {
    pub divisions: Vec<DivisionProfile>,
    pub bands: Vec<ScoreBand>,
    pub considerations: Vec<(&'static str, &'static str)>,
}

impl Rubric {
    /// The rubric the estimating team scores against. Band wording is kept
    /// exactly as the team wrote it, overlapping dollar ranges included.
    pub fn standard() -> Self {
        Self {
            divisions: vec![
                DivisionProfile {
                    division: Division::ErwRetainingWalls,
                    indicators: vec![ScopeIndicator::RetainingWalls],
                    keywords: vec![
                        "MSE walls",
                        "gravity walls",
                        "boulder walls",
                        "grade changes",
                        "tiered walls",
                        "structural walls",
                    ],
                },
                DivisionProfile {
                    division: Division::KaufmanConcrete,
                    indicators: vec![ScopeIndicator::ConcreteFlatwork],
                    keywords: vec![
                        "sidewalks",
                        "curb/gutter",
                        "concrete paving",
                        "driveways",
                        "ADA ramps",
                        "concrete steps",
                        "reinforced concrete",
                    ],
                },
                DivisionProfile {
                    division: Division::LandtecLandscape,
                    indicators: vec![
                        ScopeIndicator::Softscape,
                        ScopeIndicator::Irrigation,
                        ScopeIndicator::SyntheticTurf,
                    ],
                    keywords: vec![
                        "trees",
                        "shrubs",
                        "sod",
                        "planting",
                        "mulch",
                        "irrigation systems",
                    ],
                },
                DivisionProfile {
                    division: Division::RatliffHardscape,
                    indicators: vec![
                        ScopeIndicator::Pavers,
                        ScopeIndicator::AggregatesGravel,
                        ScopeIndicator::Furnishings,
                    ],
                    keywords: vec![
                        "pavers",
                        "stone",
                        "decomposed granite",
                        "site furnishings",
                        "benches",
                        "water features",
                        "pools",
                        "outdoor amenities",
                        "pavilions",
                        "playground equipment",
                    ],
                },
            ],
            bands: vec![
                ScoreBand {
                    level: 0,
                    description: "No meaningful scope for this company",
                },
                ScoreBand {
                    level: 1,
                    description: "Minimal scope, clearly under $250k, only useful to complete a package",
                },
                ScoreBand {
                    level: 2,
                    description: "Light scope, borderline viability ($100-250k range)",
                },
                ScoreBand {
                    level: 3,
                    description: "Decent scope, likely meets $250k threshold, worth pursuing",
                },
                ScoreBand {
                    level: 4,
                    description: "Strong scope, clearly exceeds $250k, high priority",
                },
                ScoreBand {
                    level: 5,
                    description: "Excellent scope, major opportunity ($500k+), top tier",
                },
            ],
            considerations: vec![
                (
                    "Sheet count matters",
                    "More sheets with scope = larger project",
                ),
                (
                    "Density ratings",
                    "\"High\" density sheets have more work than \"Low\" density",
                ),
                (
                    "Cross-reference summaries",
                    "The scope summaries often contain details not captured in indicator columns",
                ),
                (
                    "Package value",
                    "Even if one company has low scope, it might still be valuable to complete a turnkey package",
                ),
            ],
        }
    }

    pub fn profile(&self, division: Division) -> Option<&DivisionProfile> {
        self.divisions
            .iter()
            .find(|profile| profile.division == division)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_rubric_covers_every_division_and_level() {
        let rubric = Rubric::standard();
        for division in Division::ALL {
            let profile = rubric.profile(division).expect("profile present");
            assert!(!profile.indicators.is_empty());
            assert!(!profile.keywords.is_empty());
        }
        let levels = rubric.bands.iter().map(|band| band.level).collect::<Vec<_>>();
        assert_eq!(levels, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn division_keys_match_serialized_form() {
        for division in Division::ALL {
            let json = serde_json::to_string(&division).expect("serializes");
            assert_eq!(json, format!("\"{}\"", division.key()));
        }
    }
}
