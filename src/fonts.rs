use std::collections::{HashMap, HashSet};
use std::path::Path;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::error::Error;
use crate::layout::Measure;

/// One style variant of the report face: metrics for layout plus the raw
/// face bytes when the caller supplied a font to embed. `data` of `None`
/// means the built-in base-14 Helvetica variant (no embedding, WinAnsi
/// text encoding), which is what the stock report style uses.
pub struct ReportFont {
    name: String,
    data: Option<Vec<u8>>,
    widths_1000: Vec<f32>,
}

impl ReportFont {
    fn builtin(bold: bool) -> Self {
        Self {
            name: if bold { "Helvetica-Bold" } else { "Helvetica" }.to_string(),
            data: None,
            widths_1000: if bold {
                helvetica_bold_widths()
            } else {
                helvetica_widths()
            },
        }
    }

    fn from_bytes(data: Vec<u8>) -> Result<Self, Error> {
        let (name, widths_1000) = {
            let face = Face::parse(&data, 0)
                .map_err(|e| Error::Render(format!("cannot parse report font: {e}")))?;
            let units = face.units_per_em() as f32;
            let widths = (32u8..=255u8)
                .map(|byte| {
                    face.glyph_index(winansi_to_char(byte))
                        .and_then(|gid| face.glyph_hor_advance(gid))
                        .map(|adv| adv as f32 / units * 1000.0)
                        .unwrap_or(0.0)
                })
                .collect();
            let name = font_family_name(&face).unwrap_or_else(|| "Embedded".to_string());
            (name, widths)
        };
        Ok(Self {
            name,
            data: Some(data),
            widths_1000,
        })
    }

    /// Width of a single character in 1000-units, or `None` when the
    /// character has no usable metric and measurement must degrade.
    fn char_width_1000(&self, ch: char) -> Option<f32> {
        let byte = char_to_winansi(ch);
        if byte < 32 {
            return None;
        }
        let width = self.widths_1000[(byte - 32) as usize];
        (width > 0.0).then_some(width)
    }
}

/// Regular and bold variants for one renderer session. Stateless once
/// constructed, so a single set may serve parallel builds; embedding
/// happens per session in [`register_font`].
pub struct ReportFonts {
    regular: ReportFont,
    bold: ReportFont,
}

impl ReportFonts {
    /// The stock report face: base-14 Helvetica metrics, nothing embedded.
    pub fn builtin() -> Self {
        Self {
            regular: ReportFont::builtin(false),
            bold: ReportFont::builtin(true),
        }
    }

    /// Caller-supplied TrueType/OpenType faces, embedded and subsetted at
    /// render time.
    pub fn from_bytes(regular: Vec<u8>, bold: Vec<u8>) -> Result<Self, Error> {
        Ok(Self {
            regular: ReportFont::from_bytes(regular)?,
            bold: ReportFont::from_bytes(bold)?,
        })
    }

    pub fn from_files(regular: &Path, bold: &Path) -> Result<Self, Error> {
        Self::from_bytes(map_font_file(regular)?, map_font_file(bold)?)
    }

    pub(crate) fn font(&self, bold: bool) -> &ReportFont {
        if bold { &self.bold } else { &self.regular }
    }
}

impl Measure for ReportFonts {
    fn text_width(&self, text: &str, size: f32, bold: bool) -> Option<f32> {
        let font = self.font(bold);
        let mut width = 0.0_f32;
        for ch in text.chars() {
            width += font.char_width_1000(ch)? * size / 1000.0;
        }
        Some(width)
    }
}

fn map_font_file(path: &Path) -> Result<Vec<u8>, Error> {
    let file = std::fs::File::open(path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", e, path.display()),
        ))
    })?;
    let map = unsafe { Mmap::map(&file) }.map_err(Error::Io)?;
    Ok(map.to_vec())
}

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

/// A font as registered with one renderer session: its resource name in
/// the page font dictionaries and, for embedded faces, the glyph map the
/// content streams encode against.
pub(crate) struct RegisteredFont {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    char_to_gid: Option<HashMap<char, u16>>,
}

impl RegisteredFont {
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

/// Register one variant with the session, embedding and subsetting the
/// face when the caller supplied one. Done once per session and cached by
/// the renderer for the session's lifetime.
pub(crate) fn register_font(
    pdf: &mut Pdf,
    font: &ReportFont,
    pdf_name: String,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<RegisteredFont, Error> {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();

    let char_to_gid = match &font.data {
        Some(data) => Some(embed_truetype(
            pdf, font_ref, &font.name, data, used_chars, alloc,
        )?),
        None => {
            pdf.type1_font(font_ref)
                .base_font(Name(font.name.as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            None
        }
    };

    log::debug!(
        "register_font: {} as {pdf_name} → {:.1}ms",
        font.name,
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(RegisteredFont {
        pdf_name,
        font_ref,
        char_to_gid,
    })
}

/// Embed a TrueType/OpenType face as a CIDFont (Type0 composite) with
/// Identity-H encoding, subsetted to the glyphs the document uses.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    font_name: &str,
    font_data: &[u8],
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<HashMap<char, u16>, Error> {
    let descriptor_ref = alloc();
    let data_ref = alloc();

    let face = Face::parse(font_data, 0)
        .map_err(|e| Error::Render(format!("cannot parse report font '{font_name}': {e}")))?;

    let units = face.units_per_em() as f32;
    let ascent = face.ascender() as f32 / units * 1000.0;
    let descent = face.descender() as f32 / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| h as f32 / units * 1000.0)
        .unwrap_or(700.0);

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        bb.x_min as f32 / units * 1000.0,
        bb.y_min as f32 / units * 1000.0,
        bb.x_max as f32 / units * 1000.0,
        bb.y_max as f32 / units * 1000.0,
    );

    // Remap in sorted character order so identical inputs always produce
    // identical glyph IDs and therefore byte-identical artifacts.
    let mut chars: Vec<char> = used_chars.iter().copied().collect();
    chars.sort_unstable();

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut gid_pairs: Vec<(u16, char, f32)> = Vec::new();
    for ch in chars {
        if let Some(gid) = face.glyph_index(ch) {
            let new_gid = remapper.remap(gid.0);
            char_to_gid.insert(ch, new_gid);
            let width = face
                .glyph_hor_advance(gid)
                .map(|adv| adv as f32 / units * 1000.0)
                .unwrap_or(0.0);
            gid_pairs.push((new_gid, ch, width));
        }
    }

    let subset_data = subsetter::subset(font_data, 0, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {font_name}: {e} — embedding full font");
        font_data.to_vec()
    });

    let data_len = i32::try_from(subset_data.len())
        .map_err(|_| Error::Render(format!("font '{font_name}' too large to embed")))?;
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = font_name.replace(' ', "");

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(ascent)
        .descent(descent)
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let cid_font_ref = alloc();
    let system_info = pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    };
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(system_info);
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        gid_pairs.sort_by_key(|&(gid, _, _)| gid);
        if !gid_pairs.is_empty() {
            let mut w = cid.widths();
            for &(gid, _, width) in &gid_pairs {
                w.consecutive(gid, [width]);
            }
        }
    }

    let tounicode_ref = alloc();
    let cmap_name = format!("{}-UTF16", ps_name);
    let mut cmap = pdf_writer::types::UnicodeCmap::new(
        Name(cmap_name.as_bytes()),
        pdf_writer::types::SystemInfo {
            registry: pdf_writer::Str(b"Adobe"),
            ordering: pdf_writer::Str(b"Identity"),
            supplement: 0,
        },
    );
    for &(new_gid, ch, _) in &gid_pairs {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Ok(char_to_gid)
}

/// Windows-1252 (WinAnsi) byte to Unicode char mapping.
/// Bytes 0x80-0x9F are remapped; all others map directly to their Unicode codepoint.
fn winansi_to_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}', // bullet
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => byte as char,
    }
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str
/// encoding; unmappable characters are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(char_to_winansi)
        .filter(|&b| b != 0)
        .collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi chars 32..=255.
fn helvetica_widths() -> Vec<f32> {
    (32u8..=255u8)
        .map(|b| match b {
            32 => 278.0,                          // space
            33..=47 => 333.0,                     // punctuation
            48..=57 => 556.0,                     // digits
            58..=64 => 333.0,                     // more punctuation
            73 | 74 => 278.0,                     // I J (narrow uppercase)
            77 => 833.0,                          // M (wide)
            65..=90 => 667.0,                     // uppercase A-Z (average)
            91..=96 => 333.0,                     // brackets etc.
            102 | 105 | 106 | 108 | 116 => 278.0, // narrow lowercase: f i j l t
            109 | 119 => 833.0,                   // m w (wide)
            97..=122 => 556.0,                    // lowercase a-z (average)
            _ => 556.0,
        })
        .collect()
}

/// Approximate Helvetica-Bold widths, same scheme as [`helvetica_widths`].
fn helvetica_bold_widths() -> Vec<f32> {
    (32u8..=255u8)
        .map(|b| match b {
            32 => 278.0,                    // space
            33..=47 => 333.0,               // punctuation
            48..=57 => 556.0,               // digits
            58..=64 => 333.0,               // more punctuation
            73 | 74 => 278.0,               // I J (narrow uppercase)
            77 => 889.0,                    // M (wide)
            65..=90 => 722.0,               // uppercase A-Z (average)
            91..=96 => 333.0,               // brackets etc.
            105 | 106 | 108 => 278.0,       // narrow lowercase: i j l
            102 | 116 => 333.0,             // f t
            109 | 119 => 889.0,             // m w (wide)
            97..=122 => 611.0,              // lowercase a-z (average)
            _ => 611.0,
        })
        .collect()
}
