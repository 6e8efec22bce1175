//! The HTML fragment published as each item's description.
//!
//! Feed readers render this verbatim, so its shape is fixed: publish date,
//! author credit, poster image, then an HLS `<video>` player. Interpolated
//! values are escaped; absent ones are left empty.

use crate::models::DetailFields;
use quick_xml::escape::escape;

/// Build the description fragment for one video page.
pub fn render_description(fields: &DetailFields) -> String {
    let date = text(&fields.publish_date);
    let author_url = text(&fields.author_url);
    let author_name = text(&fields.author_name);
    let poster = text(&fields.poster_image);
    let source = text(&fields.video_source);

    format!(
        r#"<p>发布日期: {date}</p>
<p>作者: <a href="{author_url}">{author_name}</a></p>
<p>预览图:</p>
<img src="{poster}" style="max-width: 100%; height: auto; display: block;" alt="预览图" referrerpolicy="no-referrer" />
<div style="position: relative; padding-bottom: 56.25%; height: 0; overflow: hidden;">
  <video controls style="position: absolute; top: 0; left: 0; width: 100%; height: 100%;" poster="{poster}" preload="metadata">
    <source src="{source}" type="application/x-mpegURL">
    您的浏览器不支持 HTML5 视频
  </video>
</div>"#
    )
}

fn text(value: &Option<String>) -> String {
    value.as_deref().map(|v| escape(v).into_owned()).unwrap_or_default()
}
