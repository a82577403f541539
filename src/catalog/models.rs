use serde::{Deserialize, Deserializer, Serialize};

/// Seek position used for previews when an entry does not name one.
pub const DEFAULT_THUMBNAIL_TIME: f64 = 2.0;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Category1,
    Category2,
    Category3,
    Category4,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Category1,
        Category::Category2,
        Category::Category3,
        Category::Category4,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Category::Category1 => "category1",
            Category::Category2 => "category2",
            Category::Category3 => "category3",
            Category::Category4 => "category4",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.key() == key)
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Category1 => "Brand",
            Category::Category2 => "Recruiting",
            Category::Category3 => "On the job",
            Category::Category4 => "Part-time",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Category::Category1 => {
                "Films that carry the company and its events: the brand's world and the ideas behind it."
            }
            Category::Category2 => {
                "Films for welcoming new colleagues, introducing the people and the culture."
            }
            Category::Category3 => {
                "Real scenes from daily work that show what the job and the workplace feel like."
            }
            Category::Category4 => {
                "Upbeat films for students and part-timers about the fun of working with the team."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "16:9" => Some(AspectRatio::Landscape),
            "9:16" => Some(AspectRatio::Portrait),
            _ => None,
        }
    }
}

/// Card/overlay orientation class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectClass {
    Landscape,
    Portrait,
}

impl AspectClass {
    /// Explicit ratio wins; without one the layout starts portrait until media dimensions are known.
    pub fn for_entry(entry: &VideoEntry) -> Self {
        match entry.aspect_ratio {
            Some(AspectRatio::Landscape) => AspectClass::Landscape,
            Some(AspectRatio::Portrait) | None => AspectClass::Portrait,
        }
    }

    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if width > height {
            AspectClass::Landscape
        } else {
            AspectClass::Portrait
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            AspectClass::Landscape => "aspect-16-9",
            AspectClass::Portrait => "aspect-9-16",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEntry {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default = "default_thumbnail_time")]
    pub thumbnail_time: f64,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_aspect_ratio"
    )]
    pub aspect_ratio: Option<AspectRatio>,
    /// Still image shown instead of a video preview.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl VideoEntry {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            url: url.into(),
            thumbnail_time: DEFAULT_THUMBNAIL_TIME,
            aspect_ratio: None,
            thumbnail: None,
        }
    }

    /// Zero or negative seek times fall back to the default.
    pub fn preview_time(&self) -> f64 {
        if self.thumbnail_time > 0.0 {
            self.thumbnail_time
        } else {
            DEFAULT_THUMBNAIL_TIME
        }
    }
}

fn default_thumbnail_time() -> f64 {
    DEFAULT_THUMBNAIL_TIME
}

// Unknown ratios are treated as unset rather than rejecting the whole catalog.
fn lenient_aspect_ratio<'de, D>(deserializer: D) -> Result<Option<AspectRatio>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.as_deref().and_then(AspectRatio::parse))
}

/// Every category key is always present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub category1: Vec<VideoEntry>,
    #[serde(default)]
    pub category2: Vec<VideoEntry>,
    #[serde(default)]
    pub category3: Vec<VideoEntry>,
    #[serde(default)]
    pub category4: Vec<VideoEntry>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn videos(&self, category: Category) -> &[VideoEntry] {
        match category {
            Category::Category1 => &self.category1,
            Category::Category2 => &self.category2,
            Category::Category3 => &self.category3,
            Category::Category4 => &self.category4,
        }
    }

    pub fn videos_mut(&mut self, category: Category) -> &mut Vec<VideoEntry> {
        match category {
            Category::Category1 => &mut self.category1,
            Category::Category2 => &mut self.category2,
            Category::Category3 => &mut self.category3,
            Category::Category4 => &mut self.category4,
        }
    }

    /// The entry with this url and the category it was listed under.
    pub fn locate(&self, url: &str) -> Option<(Category, &VideoEntry)> {
        Category::ALL.into_iter().find_map(|category| {
            self.videos(category)
                .iter()
                .find(|video| video.url == url)
                .map(|video| (category, video))
        })
    }

    pub fn total(&self) -> usize {
        Category::ALL
            .into_iter()
            .map(|category| self.videos(category).len())
            .sum()
    }
}
