//! Field extraction for the 91porny category and video pages.
//!
//! # Listing pages
//!
//! Each entry sits in a `.colVideoList` container; the first anchor inside it
//! links to the video page.
//!
//! # Video pages
//!
//! | Field | Location |
//! |-------|----------|
//! | video source, poster | `data-src`, `data-poster` of `#video-play` |
//! | title | first `h4` |
//! | author | first `a` of the 1st `.d-inline-block.ml-2.text-small` |
//! | publish date | text of the 2nd `.d-inline-block.ml-2.text-small` |
//!
//! The author and date blocks share a class list and are told apart only by
//! their position on the page. Missing fields come back as `None`.

use crate::models::{DetailFields, DetailLink};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

static LISTING_ENTRY: Lazy<Selector> = Lazy::new(|| Selector::parse(".colVideoList").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static PLAYER: Lazy<Selector> = Lazy::new(|| Selector::parse("#video-play").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("h4").unwrap());
static INLINE_META: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".d-inline-block.ml-2.text-small").unwrap());

/// Occurrence of [`INLINE_META`] holding the author link.
const AUTHOR_BLOCK: usize = 0;
/// Occurrence of [`INLINE_META`] holding the publish date.
const DATE_BLOCK: usize = 1;

/// Collect the video page links of a category listing, in document order.
///
/// Entries without an anchor, or whose first anchor has no usable `href`,
/// are skipped.
#[instrument(level = "debug", skip_all, fields(%base))]
pub fn extract_listing(html: &str, base: &Url) -> Vec<DetailLink> {
    let document = Html::parse_document(html);

    let links: Vec<DetailLink> = document
        .select(&LISTING_ENTRY)
        .filter_map(|entry| entry.select(&ANCHOR).next())
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| resolve(base, href))
        .map(|url| DetailLink { url })
        .collect();

    debug!(count = links.len(), "Extracted detail links");
    links
}

/// Read the title, media and credit fields of a video page.
#[instrument(level = "debug", skip_all, fields(%base))]
pub fn extract_detail(html: &str, base: &Url) -> DetailFields {
    let document = Html::parse_document(html);

    let player = document.select(&PLAYER).next();
    let video_source = player.and_then(|p| non_empty(p.value().attr("data-src")));
    let poster_image = player.and_then(|p| non_empty(p.value().attr("data-poster")));

    let title = document
        .select(&TITLE)
        .next()
        .map(|h| element_text(&h))
        .unwrap_or_default();

    let author_anchor = document
        .select(&INLINE_META)
        .nth(AUTHOR_BLOCK)
        .and_then(|block| block.select(&ANCHOR).next());
    let author_name = author_anchor.and_then(|a| non_empty(Some(element_text(&a).as_str())));
    let author_url = author_anchor
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| resolve(base, href));

    let publish_date = document
        .select(&INLINE_META)
        .nth(DATE_BLOCK)
        .and_then(|block| non_empty(Some(element_text(&block).as_str())));

    DetailFields {
        title,
        video_source,
        poster_image,
        author_name,
        author_url,
        publish_date,
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://91porny.com").unwrap()
    }

    const DETAIL: &str = r#"
        <html><body>
          <h4>
            First clip title
          </h4>
          <h4>Related clip</h4>
          <div id="video-play" data-src="https://cdn.example.com/a/index.m3u8"
               data-poster="https://img.example.com/a.jpg"></div>
          <div class="d-inline-block ml-2 text-small">
            <a href="/author?uid=42"> uploader42 </a>
          </div>
          <div class="d-inline-block ml-2 text-small"> 2024-05-06 12:30 </div>
        </body></html>
    "#;

    #[test]
    fn test_listing_takes_first_anchor_per_entry_in_order() {
        let html = r#"
            <div class="colVideoList"><a href="/a">A</a><a href="/ignored">x</a></div>
            <div class="colVideoList"><span>no link</span></div>
            <div class="colVideoList"><a>no href</a><a href="/skipped">y</a></div>
            <div class="colVideoList"><a href="/b">B</a></div>
            <div class="other"><a href="/not-an-entry">Z</a></div>
            <div class="colVideoList"><a href="https://91porny.com/c">C</a></div>
        "#;

        let urls: Vec<String> = extract_listing(html, &base())
            .into_iter()
            .map(|l| l.url)
            .collect();

        assert_eq!(
            urls,
            vec![
                "https://91porny.com/a",
                "https://91porny.com/b",
                "https://91porny.com/c",
            ]
        );
    }

    #[test]
    fn test_listing_without_entries_is_empty() {
        assert!(extract_listing("<html><body><p>nothing</p></body></html>", &base()).is_empty());
        assert!(extract_listing("", &base()).is_empty());
    }

    #[test]
    fn test_detail_reads_all_fields() {
        let fields = extract_detail(DETAIL, &base());

        assert_eq!(fields.title, "First clip title");
        assert_eq!(
            fields.video_source.as_deref(),
            Some("https://cdn.example.com/a/index.m3u8")
        );
        assert_eq!(
            fields.poster_image.as_deref(),
            Some("https://img.example.com/a.jpg")
        );
        assert_eq!(fields.author_name.as_deref(), Some("uploader42"));
        assert_eq!(
            fields.author_url.as_deref(),
            Some("https://91porny.com/author?uid=42")
        );
        assert_eq!(fields.publish_date.as_deref(), Some("2024-05-06 12:30"));
    }

    #[test]
    fn test_date_comes_from_second_meta_block() {
        let html = r#"
            <div class="d-inline-block ml-2 text-small">first</div>
            <div class="d-inline-block ml-2 text-small">second</div>
            <div class="d-inline-block ml-2 text-small">third</div>
        "#;
        let fields = extract_detail(html, &base());
        assert_eq!(fields.publish_date.as_deref(), Some("second"));
        // No anchor inside the first block, so no author.
        assert_eq!(fields.author_name, None);
        assert_eq!(fields.author_url, None);
    }

    #[test]
    fn test_meta_blocks_need_all_three_classes() {
        let html = r#"
            <div class="d-inline-block ml-2"><a href="/u">not me</a></div>
            <div class="d-inline-block ml-2 text-small"><a href="/u/1">me</a></div>
        "#;
        let fields = extract_detail(html, &base());
        assert_eq!(fields.author_name.as_deref(), Some("me"));
        assert_eq!(fields.publish_date, None);
    }

    #[test]
    fn test_detail_without_author_block_degrades() {
        let html = r#"
            <h4>Lonely title</h4>
            <div id="video-play" data-src="https://cdn.example.com/x.m3u8"></div>
        "#;
        let fields = extract_detail(html, &base());

        assert_eq!(fields.title, "Lonely title");
        assert_eq!(
            fields.video_source.as_deref(),
            Some("https://cdn.example.com/x.m3u8")
        );
        assert_eq!(fields.poster_image, None);
        assert_eq!(fields.author_name, None);
        assert_eq!(fields.author_url, None);
        assert_eq!(fields.publish_date, None);
    }

    #[test]
    fn test_empty_page_yields_default_fields() {
        assert_eq!(extract_detail("", &base()), DetailFields::default());
    }
}
