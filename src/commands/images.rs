//! Image command implementations

use anyhow::Result;
use tabled::Tabled;

use crate::api::KdClient;
use crate::cli::ImagesCommand;
use crate::config::RuntimeContext;
use crate::models::ImageSearchResult;
use crate::output::{output_for_format, print_output, print_table, truncate};

#[derive(Debug, Tabled)]
struct ImageRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "STARS")]
    stars: String,
    #[tabled(rename = "OFFICIAL")]
    official: &'static str,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
}

impl From<&ImageSearchResult> for ImageRow {
    fn from(image: &ImageSearchResult) -> Self {
        Self {
            name: image.name.clone(),
            stars: image
                .star_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
            official: if image.is_official.unwrap_or(false) {
                "yes"
            } else {
                ""
            },
            description: truncate(image.description.as_deref().unwrap_or(""), 50),
        }
    }
}

pub async fn run(ctx: &RuntimeContext, command: ImagesCommand) -> Result<()> {
    match command {
        ImagesCommand::Search {
            search_key,
            page,
            registry,
        } => search(ctx, &search_key, page, registry.as_deref()).await,
        ImagesCommand::Get { image } => {
            let client = KdClient::new(ctx)?;
            let info = client.image_info(&image).await?;
            print_output(ctx, &info)
        }
    }
}

async fn search(
    ctx: &RuntimeContext,
    search_key: &str,
    page: u32,
    registry: Option<&str>,
) -> Result<()> {
    let client = KdClient::new(ctx)?;
    let result = client.search_images(search_key, page, registry).await?;

    output_for_format(ctx, &result, || {
        if result.results.is_empty() {
            println!("No images found matching '{search_key}'");
            return Ok(());
        }

        let rows: Vec<ImageRow> = result.results.iter().map(ImageRow::from).collect();
        print_table(ctx, &rows)?;
        if let Some(pages) = result.num_pages {
            println!("Page {} of {}", result.page, pages);
        }
        Ok(())
    })
}
