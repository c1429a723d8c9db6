//! The .pptx package: a zip of XML parts held in memory.
//!
//! Only the parts the generator touches are ever re-serialized; everything
//! else goes back out byte-identical. Slide cloning is a raw part copy:
//! the copied slide keeps its `_rels` (and with it the layout link), gets a
//! content-type override and a fresh entry in `p:sldIdLst`.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::Error;

pub(super) const REL_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";
const CONTENT_TYPES: &str = "[Content_Types].xml";
const SLIDE_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const SLIDE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";

pub(super) struct Package {
    parts: BTreeMap<String, Vec<u8>>,
}

impl Package {
    pub fn open(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let file = std::fs::File::open(path)?;
        let mut zip = zip::ZipArchive::new(file)?;
        let mut parts = BTreeMap::new();
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            parts.insert(entry.name().to_string(), data);
        }
        log::debug!("Opened {} ({} parts)", path.display(), parts.len());
        Ok(Self { parts })
    }

    pub fn part_text(&self, name: &str) -> Result<String, Error> {
        self.parts
            .get(name)
            .map(|data| String::from_utf8_lossy(data).into_owned())
            .ok_or_else(|| Error::MissingPart(name.to_string()))
    }

    pub fn set_part_text(&mut self, name: &str, content: String) {
        self.parts.insert(name.to_string(), content.into_bytes());
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    /// Slide part names in presentation order, resolved through
    /// `p:sldIdLst` and the presentation relationships.
    pub fn slides(&self) -> Result<Vec<String>, Error> {
        let rels = self.presentation_rels()?;
        let pres = self.part_text(PRESENTATION_PART)?;
        let doc = roxmltree::Document::parse(&pres)?;

        let mut slides = Vec::new();
        for sld_id in doc
            .descendants()
            .filter(|n| n.tag_name().name() == "sldId")
        {
            let Some(rid) = sld_id.attribute((REL_NS, "id")) else {
                continue;
            };
            match rels.iter().find(|(id, _)| id.as_str() == rid) {
                Some((_, target)) => slides.push(resolve_target(target)),
                None => {
                    return Err(Error::BadTemplate(format!(
                        "sldId references unknown relationship {rid}"
                    )));
                }
            }
        }
        if slides.is_empty() {
            return Err(Error::BadTemplate(String::from(
                "presentation has no slides",
            )));
        }
        Ok(slides)
    }

    fn presentation_rels(&self) -> Result<Vec<(String, String)>, Error> {
        let text = self.part_text(PRESENTATION_RELS)?;
        let doc = roxmltree::Document::parse(&text)?;
        Ok(doc
            .descendants()
            .filter(|n| n.tag_name().name() == "Relationship")
            .filter_map(|n| {
                Some((n.attribute("Id")?.to_string(), n.attribute("Target")?.to_string()))
            })
            .collect())
    }

    /// Duplicate a slide part (and its rels), register it, and return the
    /// new part name. The new slide is appended to the end of the deck.
    pub fn clone_slide(&mut self, src: &str) -> Result<String, Error> {
        let data = self
            .parts
            .get(src)
            .cloned()
            .ok_or_else(|| Error::MissingPart(src.to_string()))?;

        let next = self
            .parts
            .keys()
            .filter_map(|name| slide_number(name))
            .max()
            .unwrap_or(0)
            + 1;
        let new_part = format!("ppt/slides/slide{next}.xml");
        self.parts.insert(new_part.clone(), data);

        if let Some(src_num) = slide_number(src) {
            let src_rels = format!("ppt/slides/_rels/slide{src_num}.xml.rels");
            if let Some(rels) = self.parts.get(&src_rels).cloned() {
                self.parts
                    .insert(format!("ppt/slides/_rels/slide{next}.xml.rels"), rels);
            }
        }

        // Content-type override for the new part.
        let mut types = self.part_text(CONTENT_TYPES)?;
        let overr = format!(
            r#"<Override PartName="/{new_part}" ContentType="{SLIDE_CONTENT_TYPE}"/>"#
        );
        let close = types
            .rfind("</Types>")
            .ok_or_else(|| Error::BadTemplate(String::from("malformed [Content_Types].xml")))?;
        types.insert_str(close, &overr);
        self.set_part_text(CONTENT_TYPES, types);

        // Relationship from the presentation part.
        let rid = format!("rId{}", self.next_rel_number()?);
        let mut rels = self.part_text(PRESENTATION_RELS)?;
        let rel = format!(
            r#"<Relationship Id="{rid}" Type="{SLIDE_REL_TYPE}" Target="slides/slide{next}.xml"/>"#
        );
        let close = rels
            .rfind("</Relationships>")
            .ok_or_else(|| Error::BadTemplate(String::from("malformed presentation rels")))?;
        rels.insert_str(close, &rel);
        self.set_part_text(PRESENTATION_RELS, rels);

        // New p:sldId at the end of the list.
        let pres = self.part_text(PRESENTATION_PART)?;
        let entries = sld_id_entries(&pres)?;
        let max_id = entries
            .iter()
            .filter_map(|e| e.id)
            .max()
            .unwrap_or(255)
            .max(255);
        let prefix = entries
            .first()
            .map(|e| e.prefix.clone())
            .unwrap_or_else(|| String::from("p"));
        let entry = format!(r#"<{prefix}:sldId id="{}" r:id="{rid}"/>"#, max_id + 1);
        let insert_at = entries
            .last()
            .map(|e| e.range.end)
            .ok_or_else(|| Error::BadTemplate(String::from("presentation has no sldIdLst")))?;
        let mut pres = pres;
        pres.insert_str(insert_at, &entry);
        self.set_part_text(PRESENTATION_PART, pres);

        log::debug!("Cloned slide {src} -> {new_part} ({rid})");
        Ok(new_part)
    }

    /// Rewrite `p:sldIdLst` so slides appear in the given part order.
    /// `order` must be a permutation of the current slide parts.
    pub fn reorder_slides(&mut self, order: &[String]) -> Result<(), Error> {
        let rels = self.presentation_rels()?;
        let pres = self.part_text(PRESENTATION_PART)?;
        let entries = sld_id_entries(&pres)?;
        if entries.is_empty() {
            return Ok(());
        }

        let part_of = |entry: &SldIdEntry| -> Option<String> {
            let rid = entry.rid.as_deref()?;
            rels.iter()
                .find(|(id, _)| id.as_str() == rid)
                .map(|(_, target)| resolve_target(target))
        };

        let mut reordered = String::new();
        for part in order {
            let entry = entries
                .iter()
                .find(|e| part_of(e).as_deref() == Some(part.as_str()))
                .ok_or_else(|| Error::BadTemplate(format!("no sldId for {part}")))?;
            reordered.push_str(&pres[entry.range.clone()]);
        }

        let span = entries.first().unwrap().range.start..entries.last().unwrap().range.end;
        let mut pres = pres;
        pres.replace_range(span, &reordered);
        self.set_part_text(PRESENTATION_PART, pres);
        Ok(())
    }

    /// Move one slide to a new position, keeping the rest in order.
    pub fn move_slide(&mut self, old_index: usize, new_index: usize) -> Result<(), Error> {
        let mut order = self.slides()?;
        if old_index >= order.len() || new_index >= order.len() {
            return Err(Error::BadTemplate(format!(
                "slide index out of range: {old_index} -> {new_index}"
            )));
        }
        let part = order.remove(old_index);
        order.insert(new_index, part);
        self.reorder_slides(&order)
    }

    fn next_rel_number(&self) -> Result<u32, Error> {
        let max = self
            .presentation_rels()?
            .iter()
            .filter_map(|(id, _)| id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        Ok(max + 1)
    }

    /// Highest shape id used anywhere, so clones get package-unique ids.
    pub fn max_shape_id(&self) -> u64 {
        let mut max = 1;
        for (name, data) in &self.parts {
            if !name.starts_with("ppt/slides/") || !name.ends_with(".xml") {
                continue;
            }
            let text = String::from_utf8_lossy(data);
            let Ok(doc) = roxmltree::Document::parse(&text) else {
                continue;
            };
            for node in doc.descendants().filter(|n| n.tag_name().name() == "cNvPr") {
                if let Some(id) = node.attribute("id").and_then(|v| v.parse().ok()) {
                    max = max.max(id);
                }
            }
        }
        max
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(path)?;
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, data) in &self.parts {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }
        writer.finish()?;
        Ok(())
    }
}

fn slide_number(part: &str) -> Option<u32> {
    part.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{target}"),
    }
}

struct SldIdEntry {
    range: std::ops::Range<usize>,
    rid: Option<String>,
    id: Option<u32>,
    prefix: String,
}

fn sld_id_entries(pres: &str) -> Result<Vec<SldIdEntry>, Error> {
    let doc = roxmltree::Document::parse(pres)?;
    let Some(list) = doc
        .descendants()
        .find(|n| n.tag_name().name() == "sldIdLst")
    else {
        return Err(Error::BadTemplate(String::from(
            "presentation has no sldIdLst",
        )));
    };
    Ok(list
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "sldId")
        .map(|n| {
            let range = n.range();
            let raw = &pres[range.clone()];
            let prefix = raw
                .strip_prefix('<')
                .and_then(|r| r.split_once(':'))
                .filter(|(p, _)| !p.contains(char::is_whitespace))
                .map(|(p, _)| p.to_string())
                .unwrap_or_else(|| String::from("p"));
            SldIdEntry {
                range,
                rid: n.attribute((REL_NS, "id")).map(str::to_string),
                id: n.attribute("id").and_then(|v| v.parse().ok()),
                prefix,
            }
        })
        .collect())
}
