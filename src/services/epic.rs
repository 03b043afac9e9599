//! Epic Games Store extractor, reading the store's content API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{Extractor, NOT_FOUND, expect_success};
use crate::error::Result;
use crate::models::{Record, Role, Site};
use crate::utils::http::{Request, SharedFetcher};
use crate::utils::normalize::non_empty;

const CONTENT_API: &str = "https://store-content.ak.epicgames.com/api/zh-CN/content/products";

/// Epic Games Store extractor.
pub struct Epic {
    fetcher: SharedFetcher,
}

impl Epic {
    pub fn new(fetcher: SharedFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Extractor for Epic {
    async fn extract(&self, sid: &str) -> Result<Record> {
        let url = format!("{CONTENT_API}/{sid}");
        let page = self.fetcher.fetch(Request::get(url)).await?;

        if page.status == 404 {
            log::info!("epic {sid}: not found");
            return Ok(Record::failure(Site::Epic, sid, NOT_FOUND));
        }
        let product: Product = expect_success(page)?.json()?;
        if product.error.is_some() {
            log::info!("epic {sid}: content API reported an error");
            return Ok(Record::failure(Site::Epic, sid, NOT_FOUND));
        }

        log::debug!("epic {sid}: extracted");
        Ok(product.into_record(sid).succeed())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Product {
    product_name: Option<String>,
    error: Option<Value>,
    pages: Vec<ProductPage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProductPage {
    data: PageData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PageData {
    about: About,
    hero: Hero,
    gallery: Gallery,
    requirements: Requirements,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct About {
    title: Option<String>,
    short_description: Option<String>,
    description: Option<String>,
    developer_attribution: Option<String>,
    publisher_attribution: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Hero {
    logo_image: Option<Image>,
    background_image: Option<Image>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Image {
    src: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Gallery {
    gallery_images: Vec<Image>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Requirements {
    languages: Vec<String>,
    systems: Vec<System>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct System {
    system_type: String,
    details: Vec<Detail>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Detail {
    title: String,
    minimum: String,
    recommended: String,
}

impl System {
    /// Platform heading followed by its minimum and recommended lines.
    fn render(&self) -> Option<String> {
        let lines = |pick: fn(&Detail) -> &str| -> Vec<String> {
            self.details
                .iter()
                .filter(|d| !pick(d).trim().is_empty())
                .map(|d| format!("{}: {}", d.title.trim(), pick(d).trim()))
                .collect()
        };
        let minimum = lines(|d| d.minimum.as_str());
        let recommended = lines(|d| d.recommended.as_str());
        if minimum.is_empty() && recommended.is_empty() {
            return None;
        }

        let mut block = vec![self.system_type.clone()];
        if !minimum.is_empty() {
            block.push("最低配置:".to_string());
            block.extend(minimum);
        }
        if !recommended.is_empty() {
            block.push("推荐配置:".to_string());
            block.extend(recommended);
        }
        Some(block.join("\n"))
    }
}

impl Product {
    fn into_record(self, sid: &str) -> Record {
        let mut record = Record::new(Site::Epic, sid);
        record.link = Some(Site::Epic.item_link(sid));

        let data = self.pages.into_iter().next().map(|p| p.data).unwrap_or_default();
        record.this_title = self
            .product_name
            .or(data.about.title)
            .and_then(non_empty)
            .into_iter()
            .collect();
        record.poster = data
            .hero
            .logo_image
            .or(data.hero.background_image)
            .and_then(|image| non_empty(image.src));

        let synopsis: Vec<String> = [data.about.short_description, data.about.description]
            .into_iter()
            .flatten()
            .filter_map(non_empty)
            .collect();
        record.synopsis = non_empty(synopsis.join("\n\n"));

        record.push_credit(
            Role::Developer,
            data.about.developer_attribution.and_then(non_empty).into_iter().collect(),
        );
        record.push_credit(
            Role::Publisher,
            data.about.publisher_attribution.and_then(non_empty).into_iter().collect(),
        );

        let requirements = data.requirements;
        record.languages = requirements.languages.into_iter().filter_map(non_empty).collect();
        record.platforms = requirements
            .systems
            .iter()
            .filter_map(|s| non_empty(&s.system_type))
            .collect();
        let blocks: Vec<String> = requirements.systems.iter().filter_map(System::render).collect();
        record.requirements = non_empty(blocks.join("\n\n"));

        record.screenshots = data
            .gallery
            .gallery_images
            .into_iter()
            .filter_map(|image| non_empty(image.src))
            .collect();
        record
    }
}
