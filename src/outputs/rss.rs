//! RSS 2.0 serialization of a [`Feed`].
//!
//! Item descriptions are HTML and are written as escaped text, which RSS
//! readers decode before rendering.

use crate::models::{Feed, FeedItem};
use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::error::Error;
use std::io::Write;
use tracing::{debug, instrument};

/// Render `feed` as an RSS 2.0 document stamped with `built_at`.
#[instrument(level = "info", skip_all, fields(items = feed.items.len()))]
pub fn feed_to_rss(feed: &Feed, built_at: DateTime<Utc>) -> Result<String, Box<dyn Error>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer.write_event(Event::Start(
        BytesStart::new("rss").with_attributes([("version", "2.0")]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    write_text_element(&mut writer, "title", &feed.title)?;
    write_text_element(&mut writer, "link", &feed.link)?;
    write_text_element(&mut writer, "description", &feed.description)?;
    write_text_element(&mut writer, "lastBuildDate", &built_at.to_rfc2822())?;
    write_text_element(
        &mut writer,
        "generator",
        concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")),
    )?;

    for item in &feed.items {
        write_item(&mut writer, item)?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    let xml = String::from_utf8(writer.into_inner())?;
    debug!(bytes = xml.len(), "Rendered RSS");
    Ok(xml)
}

fn write_item<W: Write>(writer: &mut Writer<W>, item: &FeedItem) -> Result<(), Box<dyn Error>> {
    writer.write_event(Event::Start(BytesStart::new("item")))?;
    write_text_element(writer, "title", &item.title)?;
    write_text_element(writer, "link", &item.link)?;

    writer.write_event(Event::Start(
        BytesStart::new("guid").with_attributes([("isPermaLink", "true")]),
    ))?;
    writer.write_event(Event::Text(BytesText::new(&item.link)))?;
    writer.write_event(Event::End(BytesEnd::new("guid")))?;

    if let Some(pub_date) = item.pub_date {
        write_text_element(writer, "pubDate", &pub_date.to_rfc2822())?;
    }
    write_text_element(writer, "description", &item.description)?;
    writer.write_event(Event::End(BytesEnd::new("item")))?;
    Ok(())
}

fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), Box<dyn Error>> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
