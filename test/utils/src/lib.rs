use std::io::Cursor;

use image::ImageFormat;
use image::Rgb;
use image::RgbImage;
use serde_json::json;
use serde_json::Value;

fn encode_fixture(format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(8, 8, |x, y| {
        if (x + y) % 2 == 0 {
            return Rgb([200, 30, 30]);
        }
        return Rgb([250, 250, 250]);
    });

    let mut bytes = Cursor::new(vec![]);
    img.write_to(&mut bytes, format).unwrap();
    return bytes.into_inner();
}

/// A small, valid JPEG.
pub fn jpeg_fixture() -> Vec<u8> {
    return encode_fixture(ImageFormat::Jpeg);
}

/// A small, valid PNG.
pub fn png_fixture() -> Vec<u8> {
    return encode_fixture(ImageFormat::Png);
}

fn rich_text(text: &str) -> Value {
    if text.is_empty() {
        return json!({ "rich_text": [] });
    }

    return json!({
        "type": "rich_text",
        "rich_text": [{
            "type": "text",
            "text": { "content": text, "link": null },
            "plain_text": text,
            "href": null
        }]
    });
}

/// A Notion database row with the columns the prompt store reads.
pub fn notion_page_fixture(setting_name: &str, page: &str, prompt: &str, email: &str) -> Value {
    return json!({
        "object": "page",
        "id": format!("page-{setting_name}-{page}"),
        "properties": {
            "setting_name": rich_text(setting_name),
            "page": rich_text(page),
            "prompt": rich_text(prompt),
            "email": rich_text(email)
        }
    });
}

/// A Notion database query response wrapping `pages`.
pub fn notion_query_fixture(pages: Vec<Value>) -> Value {
    return json!({
        "object": "list",
        "results": pages,
        "next_cursor": null,
        "has_more": false
    });
}
