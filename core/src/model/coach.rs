use super::util::{lenient_f64, string_list, string_or_number};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "CoachRecord")]
pub struct Coach {
    pub id: Option<String>,
    pub name: String,
    pub title: Option<String>,
    pub specialties: Vec<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub hourly_rate: Option<f64>,
    pub rating: Option<f64>,
    pub years_experience: Option<f64>,
}

/// Wire shape of a coach. Listings may carry both a key and its legacy
/// spelling (`_id` next to a virtual `id`), so each spelling gets its own
/// slot and [`Coach`] takes the first one present.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoachRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    id: Option<String>,
    #[serde(default, rename = "_id", deserialize_with = "string_or_number")]
    object_id: Option<String>,
    name: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    specialties: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    specialty: Vec<String>,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    profile_image: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    hourly_rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    rate: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    years_experience: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    experience: Option<f64>,
}

impl From<CoachRecord> for Coach {
    fn from(r: CoachRecord) -> Self {
        Self {
            id: r.id.or(r.object_id),
            name: r.name,
            title: r.title,
            specialties: if r.specialties.is_empty() {
                r.specialty
            } else {
                r.specialties
            },
            bio: r.bio,
            avatar: r.avatar.or(r.image).or(r.profile_image),
            hourly_rate: r.hourly_rate.or(r.rate).or(r.price),
            rating: r.rating,
            years_experience: r.years_experience.or(r.experience),
        }
    }
}

impl Coach {
    pub fn has_specialty(&self, specialty: &str) -> bool {
        self.specialties
            .iter()
            .any(|s| s.eq_ignore_ascii_case(specialty))
    }
}

/// Filter chips shown above the marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
pub enum Specialty {
    #[strum(serialize = "All")]
    All,
    #[strum(serialize = "Career Transitions")]
    CareerTransitions,
    #[strum(serialize = "Leadership")]
    Leadership,
    #[strum(serialize = "Executive Coaching")]
    ExecutiveCoaching,
    #[strum(serialize = "Business Growth")]
    BusinessGrowth,
    #[strum(serialize = "Personal Branding")]
    PersonalBranding,
    #[strum(serialize = "Life Coaching")]
    LifeCoaching,
    #[strum(serialize = "Wellness")]
    Wellness,
}

impl Specialty {
    /// The listing filter for this chip; `All` clears it.
    pub fn filter(&self) -> Option<String> {
        match self {
            Specialty::All => None,
            s => Some(s.to_string()),
        }
    }
}
