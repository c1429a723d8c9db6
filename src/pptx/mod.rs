//! Templated deck generation.
//!
//! The generator recognizes a template's slide roles by marker shape
//! names, clones the content (and optional chapter-cover) slide once per
//! chapter, renames the cloned prototypes to the chapter's
//! `page{N}_...` namespace, and fills cover, table of contents, nav,
//! description, bullet/content/keyword boxes and page numbers.

mod layout;
mod package;
mod shapes;
pub mod template;

use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::model::{ContentBlock, PresentationData, SlideData};

use layout::{distribute_x, estimate_text_height, inches_to_emu, stack_step};
use package::Package;
use shapes::{Geom, Para, Shape, SlideXml};

/// Hard cap on rendered chapters; templates are authored for at most
/// eight TOC slots and nav items.
pub const MAX_CHAPTERS: usize = 8;

const BLOCK_GAP_IN: f32 = 0.15;

/// Nav distribution only kicks in for nav-sized prototypes; a title box
/// wider than a third of the slide is filled in place instead.
const NAV_MAX_FRACTION: i64 = 3;

/// Cover metadata boxes and the key labels that feed them.
const COVER_META: [(&str, &[&str]); 5] = [
    ("cover_project", &["Project", "Project Name", "项目名称"]),
    ("cover_presenter", &["Presenter", "Speaker", "汇报人"]),
    ("cover_dept", &["Department", "Team", "部门 / 团队", "部门"]),
    ("cover_date", &["Date", "日期"]),
    ("cover_company", &["Company", "公司名称"]),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PageKind {
    Cover,
    Toc,
    ChapterCover,
    Content,
    End,
}

struct Page {
    part: String,
    xml: SlideXml,
    kind: PageKind,
}

/// `"page3_bullet1"` → `(3, "bullet1")`.
fn page_role(name: &str) -> Option<(usize, &str)> {
    let rest = name.strip_prefix("page")?;
    let digits_end = rest.find('_')?;
    let number: usize = rest[..digits_end].parse().ok()?;
    Some((number, &rest[digits_end + 1..]))
}

/// `"bullet2"` → `("bullet", 2)`.
fn split_numbered(role: &str) -> Option<(&str, usize)> {
    let digits_start = role.find(|c: char| c.is_ascii_digit())?;
    let idx: usize = role[digits_start..].parse().ok()?;
    Some((&role[..digits_start], idx))
}

fn classify(xml: &SlideXml) -> PageKind {
    let mut kind = PageKind::End;
    for shape in &xml.shapes {
        if shape.name == "cover_title" {
            return PageKind::Cover;
        }
        if shape.name == "chapter_title" {
            return PageKind::ChapterCover;
        }
        if let Some((_, role)) = page_role(&shape.name) {
            if role.ends_with("_num") {
                return PageKind::Toc;
            }
            if role == "desc" || role.starts_with("bullet") || role.starts_with("content") {
                kind = PageKind::Content;
            }
        }
    }
    kind
}

pub struct Generator {
    package: Package,
    output: PathBuf,
    next_shape_id: u64,
    slide_width: i64,
}

impl Generator {
    pub fn new(template: &Path, output: &Path) -> Result<Self, Error> {
        let package = Package::open(template)?;
        let next_shape_id = package.max_shape_id() + 1;
        let slide_width = slide_width(&package).unwrap_or(inches_to_emu(10.0));
        Ok(Self {
            package,
            output: output.to_path_buf(),
            next_shape_id,
            slide_width,
        })
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_shape_id;
        self.next_shape_id += 1;
        id
    }

    /// Fill the template from `data` and write the deck to the output
    /// path given at construction. Returns the output path.
    pub fn generate(&mut self, data: &PresentationData) -> Result<PathBuf, Error> {
        let mut chapters: Vec<SlideData> = data.slides.clone();
        if chapters.len() > MAX_CHAPTERS {
            log::warn!(
                "{} chapters exceed the template capacity; keeping the first {MAX_CHAPTERS}",
                chapters.len()
            );
            chapters.truncate(MAX_CHAPTERS);
        }

        let mut pages = self.load_pages()?;

        let content_proto = pages
            .iter()
            .position(|p| p.kind == PageKind::Content)
            .ok_or_else(|| {
                Error::BadTemplate(String::from(
                    "template has no content slide (page1_desc / page1_bullet1)",
                ))
            })?;
        let chapter_proto = pages.iter().position(|p| p.kind == PageKind::ChapterCover);

        // Prototype shapes stay reachable for cross-slide fallback even
        // after the pages themselves are renamed and filled.
        let prototypes: Vec<Shape> = pages
            .iter()
            .flat_map(|p| p.xml.shapes.iter())
            .filter(|s| matches!(page_role(&s.name), Some((n, _)) if n <= 3))
            .cloned()
            .collect();

        // Clone template slides while they are still pristine: one content
        // slide (and chapter cover, when the template has one) per chapter
        // beyond the first.
        let mut content_parts = vec![pages[content_proto].part.clone()];
        let mut chapter_parts = chapter_proto
            .map(|idx| vec![pages[idx].part.clone()])
            .unwrap_or_default();
        for _ in 1..chapters.len().max(1) {
            content_parts.push(self.package.clone_slide(&content_parts[0])?);
            if !chapter_parts.is_empty() {
                chapter_parts.push(self.package.clone_slide(&chapter_parts[0])?);
            }
        }
        for part in content_parts.iter().skip(1) {
            let text = self.package.part_text(part)?;
            pages.push(Page {
                part: part.clone(),
                xml: SlideXml::parse(&text)?,
                kind: PageKind::Content,
            });
        }
        for part in chapter_parts.iter().skip(1) {
            let text = self.package.part_text(part)?;
            pages.push(Page {
                part: part.clone(),
                xml: SlideXml::parse(&text)?,
                kind: PageKind::ChapterCover,
            });
        }

        self.fill_cover(&mut pages, data);
        self.fill_toc(&mut pages, &chapters);

        for (k, chapter) in chapters.iter().enumerate() {
            let page = pages
                .iter_mut()
                .find(|p| p.part == content_parts[k])
                .unwrap();
            self.fill_content_page(&mut page.xml, chapter, &chapters, &prototypes);

            if let Some(part) = chapter_parts.get(k) {
                let page = pages.iter_mut().find(|p| &p.part == part).unwrap();
                fill_if_present(
                    &mut page.xml,
                    "chapter_num",
                    &format!("{:02}", chapter.chapter),
                );
                fill_if_present(&mut page.xml, "chapter_title", &chapter.title);
            }
        }

        // Final slide order: cover, TOC, chapters (cover page then
        // content), everything else at the end.
        let mut order: Vec<String> = Vec::new();
        for kind in [PageKind::Cover, PageKind::Toc] {
            order.extend(
                pages
                    .iter()
                    .filter(|p| p.kind == kind)
                    .map(|p| p.part.clone()),
            );
        }
        for k in 0..chapters.len().max(1) {
            if let Some(part) = chapter_parts.get(k) {
                order.push(part.clone());
            }
            if let Some(part) = content_parts.get(k) {
                order.push(part.clone());
            }
        }
        for page in &pages {
            if !order.contains(&page.part) {
                order.push(page.part.clone());
            }
        }

        // Page-number boxes carry the slide's final ordinal.
        for page in &mut pages {
            if let Some(pos) = order.iter().position(|part| part == &page.part) {
                fill_if_present(&mut page.xml, "page_num", &(pos + 1).to_string());
            }
        }

        for page in &pages {
            self.package.set_part_text(&page.part, page.xml.to_xml());
        }
        self.package.reorder_slides(&order)?;
        self.package.save(&self.output)?;

        log::info!(
            "Deck generated at {} ({} slides, {} chapters)",
            self.output.display(),
            order.len(),
            chapters.len()
        );
        Ok(self.output.clone())
    }

    fn load_pages(&self) -> Result<Vec<Page>, Error> {
        let mut pages = Vec::new();
        for part in self.package.slides()? {
            let text = self.package.part_text(&part)?;
            let xml = SlideXml::parse(&text)?;
            let kind = classify(&xml);
            log::debug!("{part}: {kind:?}");
            pages.push(Page { part, xml, kind });
        }
        Ok(pages)
    }

    /// Fill every `cover_*` box in the deck from the cover title and the
    /// metadata key-value map. Empty values leave the template text alone.
    fn fill_cover(&self, pages: &mut [Page], data: &PresentationData) {
        for page in pages.iter_mut() {
            if !data.cover_title.is_empty() {
                fill_if_present(&mut page.xml, "cover_title", &data.cover_title);
            }
            for (shape_name, keys) in COVER_META {
                if let Some(value) = data.meta(keys)
                    && !value.is_empty()
                {
                    fill_if_present(&mut page.xml, shape_name, value);
                }
            }
        }
    }

    /// Fill the table of contents: existing `page{N}_title[_num]` pairs
    /// are set in place, missing chapters get clones of the first pair
    /// stacked below it, leftover template pairs beyond the chapter count
    /// are dropped.
    fn fill_toc(&mut self, pages: &mut [Page], chapters: &[SlideData]) {
        let Some(page) = pages.iter_mut().find(|p| p.kind == PageKind::Toc) else {
            return;
        };
        if chapters.is_empty() {
            return;
        }
        let xml = &mut page.xml;

        let find_pair = |xml: &SlideXml, n: usize| {
            (
                xml.find(&format!("page{n}_title_num")),
                xml.find(&format!("page{n}_title")),
            )
        };

        let Some(base) = (1..=MAX_CHAPTERS).find(|n| find_pair(xml, *n).0.is_some()) else {
            log::warn!("TOC slide has no page{{N}}_title_num prototype");
            return;
        };
        let (num_proto_idx, title_proto_idx) = find_pair(xml, base);
        let num_proto = xml.shapes[num_proto_idx.unwrap()].clone();
        let title_proto = title_proto_idx.map(|i| xml.shapes[i].clone());

        let step = {
            let next_y = find_pair(xml, base + 1)
                .0
                .and_then(|i| xml.shapes[i].geom)
                .map(|g| g.y);
            match num_proto.geom {
                Some(g) => stack_step(g.y, g.cy, next_y),
                None => inches_to_emu(0.75),
            }
        };

        for chapter in chapters {
            let i = chapter.chapter;
            let dy = (i as i64 - base as i64) * step;
            let num_text = format!("{:02}", i);
            let (num_idx, title_idx) = find_pair(xml, i);

            match num_idx {
                Some(idx) => xml.shapes[idx].set_text(&[Para::plain(num_text)]),
                None => {
                    let id = self.alloc_id();
                    let clone = num_proto.filled(
                        id,
                        &format!("page{i}_title_num"),
                        shifted(num_proto.geom, dy),
                        &[Para::plain(num_text)],
                    );
                    xml.shapes.push(clone);
                }
            }
            match (title_idx, &title_proto) {
                (Some(idx), _) => xml.shapes[idx].set_text(&[Para::plain(chapter.title.clone())]),
                (None, Some(proto)) => {
                    let id = self.alloc_id();
                    let clone = proto.filled(
                        id,
                        &format!("page{i}_title"),
                        shifted(proto.geom, dy),
                        &[Para::plain(chapter.title.clone())],
                    );
                    xml.shapes.push(clone);
                }
                (None, None) => log::warn!("Shape 'page{i}_title' not found in template"),
            }
        }

        // Template pairs for chapters that do not exist would keep their
        // placeholder text; drop them.
        let n = chapters.len();
        xml.shapes.retain(|s| match page_role(&s.name) {
            Some((k, "title" | "title_num")) => k <= n,
            _ => true,
        });
    }

    /// Populate one content slide for `chapter`: rename the prototype
    /// namespace, lay out the nav row, fill description and content
    /// blocks, stacking cloned boxes with estimated heights.
    fn fill_content_page(
        &mut self,
        xml: &mut SlideXml,
        chapter: &SlideData,
        chapters: &[SlideData],
        prototypes: &[Shape],
    ) {
        let i = chapter.chapter;

        // Normalize this slide's prototype names into the chapter's
        // namespace (page{base}_* -> page{i}_*).
        let base = xml
            .shapes
            .iter()
            .filter_map(|s| page_role(&s.name).map(|(n, _)| n))
            .min();
        if let Some(base) = base
            && base != i
        {
            for shape in &mut xml.shapes {
                let name = shape.name.clone();
                if let Some((n, role)) = page_role(&name)
                    && n == base
                {
                    *shape = shape.with_identity(shape.id, &format!("page{i}_{role}"));
                }
            }
        }

        self.fill_nav(xml, chapter, chapters);

        if !chapter.description.is_empty() {
            match xml.find(&format!("page{i}_desc")) {
                Some(idx) => {
                    let paras: Vec<Para> = chapter.description.lines().map(Para::plain).collect();
                    xml.shapes[idx].set_text(&paras);
                }
                None => log::warn!("Shape 'page{i}_desc' not found in template"),
            }
        }

        self.fill_blocks(xml, chapter, prototypes);
    }

    /// Nav row: a nav-sized title prototype is cloned per chapter and
    /// spread across the slide width, the current chapter in place and
    /// bold. A full-width title box is just filled with the chapter title.
    fn fill_nav(&mut self, xml: &mut SlideXml, chapter: &SlideData, chapters: &[SlideData]) {
        let i = chapter.chapter;
        let Some(title_idx) = xml.find(&format!("page{i}_title")) else {
            log::warn!("Shape 'page{i}_title' not found in template");
            return;
        };
        let proto = xml.shapes[title_idx].clone();

        let nav_sized = proto
            .geom
            .map(|g| g.cx <= self.slide_width / NAV_MAX_FRACTION)
            .unwrap_or(false);
        if chapters.len() < 2 || !nav_sized {
            xml.shapes[title_idx].set_text(&[Para::plain(chapter.title.clone())]);
            return;
        }

        let origin = proto.geom.unwrap();
        let usable = self.slide_width - 2 * origin.x;
        let n = chapters.len();
        for (k, other) in chapters.iter().enumerate() {
            let slot = Geom {
                x: distribute_x(origin.x, usable, n, k),
                ..origin
            };
            if other.chapter == i {
                xml.shapes[title_idx] = proto.filled(
                    proto.id,
                    &format!("page{i}_title"),
                    Some(slot),
                    &[Para::bold(chapter.title.clone())],
                );
            } else {
                let id = self.alloc_id();
                let clone = proto.filled(
                    id,
                    &format!("page{i}_nav{}", other.chapter),
                    Some(slot),
                    &[Para::plain(other.title.clone())],
                );
                xml.shapes.push(clone);
            }
        }
    }

    /// Fill block boxes for one chapter, cloning the first box as a
    /// prototype for blocks beyond what the template authored and
    /// stacking the clones with estimated heights.
    fn fill_blocks(&mut self, xml: &mut SlideXml, chapter: &SlideData, prototypes: &[Shape]) {
        let i = chapter.chapter;

        let local_proto = |xml: &SlideXml, role: &str| -> Option<Shape> {
            xml.find(&format!("page{i}_{role}1"))
                .map(|idx| xml.shapes[idx].clone())
        };
        // Bullet boxes are the primary block container; templates built
        // around plain content boxes fall back to those, and a prototype
        // from another template slide is the last resort.
        let (role, proto) = match local_proto(xml, "bullet") {
            Some(p) => ("bullet", Some(p)),
            None => match local_proto(xml, "content") {
                Some(p) => ("content", Some(p)),
                None => ("bullet", find_prototype(prototypes, "bullet1")),
            },
        };
        let keyword_proto =
            local_proto(xml, "keyword").or_else(|| find_prototype(prototypes, "keyword1"));

        let gap = inches_to_emu(BLOCK_GAP_IN);
        let mut cursor = proto.as_ref().and_then(|p| p.geom).map(|g| g.y);

        for (j, block) in chapter.blocks.iter().enumerate() {
            let j1 = j + 1;
            let name = format!("page{i}_{role}{j1}");
            let paras = block_paragraphs(block, role);
            let flat = paras
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");

            let font = proto
                .as_ref()
                .map(|p| p.font_size_pt())
                .unwrap_or(layout::DEFAULT_FONT_PT);
            let width = proto
                .as_ref()
                .and_then(|p| p.geom)
                .map(|g| g.cx)
                .unwrap_or(inches_to_emu(9.0));
            let est_height = estimate_text_height(&flat, width, font);

            let block_top = match xml.find(&name) {
                Some(idx) => {
                    let top = xml.shapes[idx].geom.map(|g| g.y);
                    xml.shapes[idx].set_text(&paras);
                    top
                }
                None => match &proto {
                    Some(proto) => {
                        let geom = proto.geom.map(|g| Geom {
                            y: cursor.unwrap_or(g.y),
                            cy: est_height,
                            ..g
                        });
                        let id = self.alloc_id();
                        let clone = proto.filled(id, &name, geom, &paras);
                        let top = clone.geom.map(|g| g.y);
                        xml.shapes.push(clone);
                        top
                    }
                    None => {
                        log::warn!(
                            "Shape '{name}' not found in template (for content: {})",
                            block.subtitle
                        );
                        None
                    }
                },
            };

            if let Some(cur) = cursor.as_mut() {
                *cur = block_top.unwrap_or(*cur) + est_height + gap;
            }

            if !block.keyword.is_empty() {
                let kw_name = format!("page{i}_keyword{j1}");
                match xml.find(&kw_name) {
                    Some(idx) => xml.shapes[idx].set_text(&[Para::plain(block.keyword.clone())]),
                    None => {
                        if let Some(kw_proto) = &keyword_proto {
                            let geom = kw_proto.geom.map(|g| Geom {
                                y: block_top.map(|top| top + est_height).unwrap_or(g.y),
                                ..g
                            });
                            let id = self.alloc_id();
                            let clone = kw_proto.filled(
                                id,
                                &kw_name,
                                geom,
                                &[Para::plain(block.keyword.clone())],
                            );
                            xml.shapes.push(clone);
                        }
                    }
                }
            }
        }

        // Unused template block boxes would keep their placeholder text.
        let n = chapter.blocks.len();
        xml.shapes.retain(|s| match page_role(&s.name) {
            Some((k, r)) if k == i => match split_numbered(r) {
                Some(("bullet" | "content" | "keyword", idx)) => idx <= n,
                _ => true,
            },
            _ => true,
        });
    }
}

fn block_paragraphs(block: &ContentBlock, role: &str) -> Vec<Para> {
    let mut paras = Vec::new();
    if !block.subtitle.is_empty() {
        paras.push(Para::bold(block.subtitle.clone()));
    }
    if role == "content" {
        paras.extend(block.bullets.iter().map(Para::plain));
    } else {
        paras.extend(block.bullets.iter().map(Para::bullet));
    }
    if paras.is_empty() {
        paras.push(Para::plain(""));
    }
    paras
}

fn find_prototype(prototypes: &[Shape], role: &str) -> Option<Shape> {
    (1..=3).find_map(|n| {
        let want = format!("page{n}_{role}");
        prototypes.iter().find(|s| s.name == want).cloned()
    })
}

fn fill_if_present(xml: &mut SlideXml, name: &str, text: &str) {
    if let Some(idx) = xml.find(name) {
        xml.shapes[idx].set_text(&[Para::plain(text)]);
    }
}

fn shifted(geom: Option<Geom>, dy: i64) -> Option<Geom> {
    geom.map(|g| Geom { y: g.y + dy, ..g })
}

fn slide_width(package: &Package) -> Option<i64> {
    let pres = package.part_text("ppt/presentation.xml").ok()?;
    let doc = roxmltree::Document::parse(&pres).ok()?;
    doc.descendants()
        .find(|n| n.tag_name().name() == "sldSz")
        .and_then(|n| n.attribute("cx"))
        .and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_roles_parse() {
        assert_eq!(page_role("page3_bullet1"), Some((3, "bullet1")));
        assert_eq!(page_role("page1_title_num"), Some((1, "title_num")));
        assert_eq!(page_role("page_num"), None);
        assert_eq!(page_role("cover_title"), None);
    }

    #[test]
    fn numbered_roles_split() {
        assert_eq!(split_numbered("bullet2"), Some(("bullet", 2)));
        assert_eq!(split_numbered("keyword1"), Some(("keyword", 1)));
        assert_eq!(split_numbered("desc"), None);
    }
}
