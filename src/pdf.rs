//! Document renderer: executes the positioned instruction stream against
//! pdf-writer and serializes the result. Pages are created lazily in
//! instruction order; the renderer owns no state beyond one session and
//! never touches the filesystem.

use std::collections::HashSet;

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::error::Error;
use crate::fonts::{ReportFonts, register_font};
use crate::layout::DrawInstruction;
use crate::model::PageGeometry;

pub fn render(
    instructions: &[DrawInstruction],
    geometry: &PageGeometry,
    fonts: &ReportFonts,
) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    // Session start: register both variants once, subsetted to exactly the
    // characters the stream draws. Cached for the session's lifetime.
    let (regular_chars, bold_chars) = used_chars(instructions);
    let regular = register_font(&mut pdf, fonts.font(false), "F1".into(), &regular_chars, &mut alloc)?;
    let bold = register_font(&mut pdf, fonts.font(true), "F2".into(), &bold_chars, &mut alloc)?;
    let t_fonts = t0.elapsed();

    let mut all_contents: Vec<Content> = Vec::new();
    let mut content = Content::new();
    let mut open_page = 1usize;

    for instruction in instructions {
        match instruction {
            DrawInstruction::Text {
                page,
                x,
                y,
                content: text,
                size,
                bold: is_bold,
                color,
            } => {
                if *page != open_page {
                    return Err(Error::Render(format!(
                        "out-of-order instruction: text targets page {page} while page {open_page} is open"
                    )));
                }
                let font = if *is_bold { &bold } else { &regular };
                let [r, g, b] = *color;
                content.begin_text();
                content.set_font(Name(font.pdf_name.as_bytes()), *size);
                content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
                content.next_line(*x, *y);
                content.show(Str(&font.encode(text)));
                content.end_text();
            }
            DrawInstruction::Line {
                page,
                x1,
                y1,
                x2,
                y2,
                color,
            } => {
                if *page != open_page {
                    return Err(Error::Render(format!(
                        "out-of-order instruction: line targets page {page} while page {open_page} is open"
                    )));
                }
                let [r, g, b] = *color;
                content.save_state();
                content.set_line_width(1.0);
                content.set_stroke_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
                content.move_to(*x1, *y1);
                content.line_to(*x2, *y2);
                content.stroke();
                content.restore_state();
            }
            DrawInstruction::PageBreak => {
                // Finalize the open page, open the next.
                all_contents.push(std::mem::replace(&mut content, Content::new()));
                open_page += 1;
            }
        }
    }
    all_contents.push(content);
    let t_stream = t0.elapsed();

    // Assembly: allocate page and content IDs now that page count is known.
    let n = all_contents.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, c) in all_contents.into_iter().enumerate() {
        let raw = c.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed)
            .filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, geometry.width, geometry.height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        let mut font_dict = resources.fonts();
        font_dict.pair(Name(regular.pdf_name.as_bytes()), regular.font_ref);
        font_dict.pair(Name(bold.pdf_name.as_bytes()), bold.font_ref);
    }

    let t_assembly = t0.elapsed();
    log::info!(
        "Render phases: font_embed={:.1}ms, stream={:.1}ms, assembly={:.1}ms ({n} pages)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_stream - t_fonts).as_secs_f64() * 1000.0,
        (t_assembly - t_stream).as_secs_f64() * 1000.0,
    );

    Ok(pdf.finish())
}

/// Characters drawn per variant, for glyph subsetting.
fn used_chars(instructions: &[DrawInstruction]) -> (HashSet<char>, HashSet<char>) {
    let mut regular = HashSet::new();
    let mut bold = HashSet::new();
    for instruction in instructions {
        if let DrawInstruction::Text {
            content,
            bold: is_bold,
            ..
        } = instruction
        {
            let set = if *is_bold { &mut bold } else { &mut regular };
            set.extend(content.chars());
        }
    }
    // Space is always available even if no run contains one.
    regular.insert(' ');
    bold.insert(' ');
    (regular, bold)
}
