//! Shape handles over raw slide XML.
//!
//! A `Shape` owns its `<p:sp>` (or other spTree child) fragment as text,
//! with name/id/geometry cached from a parse. Edits rebuild the fragment
//! from captured template parts: `p:spPr` and `p:style` are carried
//! verbatim, the text body keeps the prototype's `a:bodyPr` and first-run
//! formatting, and only identity, offsets, and paragraphs are re-emitted.

use std::fmt::Write as _;

use crate::error::Error;
use crate::pptx::layout::DEFAULT_FONT_PT;

pub(super) const PML_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
pub(super) const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

const WRAP_OPEN: &str = concat!(
    r#"<frag xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#,
    r#" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main""#,
    r#" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#,
    r#" xmlns:p14="http://schemas.microsoft.com/office/powerpoint/2010/main""#,
    r#" xmlns:a14="http://schemas.microsoft.com/office/drawing/2010/main""#,
    r#" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006">"#
);
const WRAP_CLOSE: &str = "</frag>";

pub(super) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Shape position and size in EMU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geom {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

/// One paragraph for a text-set operation.
#[derive(Clone, Debug, Default)]
pub(super) struct Para {
    pub text: String,
    pub level: u8,
    pub bold: Option<bool>,
}

impl Para {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: Some(true),
            ..Default::default()
        }
    }

    pub fn bullet(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: 1,
            ..Default::default()
        }
    }
}

/// First-run character formatting captured from a prototype shape.
#[derive(Clone, Debug, Default)]
pub(super) struct RunFormat {
    pub size_cpt: Option<u32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    /// Raw `<a:solidFill>...</a:solidFill>` fragment.
    pub fill: Option<String>,
    pub latin: Option<String>,
    pub ea: Option<String>,
}

impl RunFormat {
    fn from_rpr(wrapped: &str, rpr: roxmltree::Node) -> Self {
        let attr_bool = |name: &str| {
            rpr.attribute(name)
                .map(|v| v != "0" && v != "false")
        };
        let mut format = Self {
            size_cpt: rpr.attribute("sz").and_then(|v| v.parse().ok()),
            bold: attr_bool("b"),
            italic: attr_bool("i"),
            fill: None,
            latin: None,
            ea: None,
        };
        for child in rpr.children().filter(|n| n.is_element()) {
            if child.tag_name().namespace() != Some(DML_NS) {
                continue;
            }
            match child.tag_name().name() {
                "solidFill" => format.fill = Some(wrapped[child.range()].to_string()),
                "latin" => format.latin = child.attribute("typeface").map(str::to_string),
                "ea" => format.ea = child.attribute("typeface").map(str::to_string),
                _ => {}
            }
        }
        format
    }

    pub fn font_size_pt(&self) -> f32 {
        self.size_cpt
            .map(|cpt| cpt as f32 / 100.0)
            .unwrap_or(DEFAULT_FONT_PT)
    }

    /// Emit an `<a:rPr>` carrying this formatting. The east-asian typeface
    /// follows the latin one when the prototype declared only the latter,
    /// so CJK text picks up the intended face.
    fn emit_rpr(&self, bold_override: Option<bool>) -> String {
        let mut attrs = String::from(r#" lang="en-US""#);
        if let Some(sz) = self.size_cpt {
            let _ = write!(attrs, r#" sz="{sz}""#);
        }
        if let Some(b) = bold_override.or(self.bold) {
            let _ = write!(attrs, r#" b="{}""#, if b { 1 } else { 0 });
        }
        if let Some(i) = self.italic {
            let _ = write!(attrs, r#" i="{}""#, if i { 1 } else { 0 });
        }
        attrs.push_str(r#" dirty="0""#);

        let mut children = String::new();
        if let Some(fill) = &self.fill {
            children.push_str(fill);
        }
        if let Some(latin) = &self.latin {
            let _ = write!(children, r#"<a:latin typeface="{}"/>"#, escape_xml(latin));
        }
        if let Some(ea) = self.ea.as_ref().or(self.latin.as_ref()) {
            let _ = write!(children, r#"<a:ea typeface="{}"/>"#, escape_xml(ea));
        }

        if children.is_empty() {
            format!("<a:rPr{attrs}/>")
        } else {
            format!("<a:rPr{attrs}>{children}</a:rPr>")
        }
    }
}

/// A single spTree child, held as raw XML with cached metadata.
#[derive(Clone, Debug)]
pub(super) struct Shape {
    pub xml: String,
    pub name: String,
    pub id: u64,
    pub geom: Option<Geom>,
    /// Local tag name: "sp", "pic", "graphicFrame", ...
    pub kind: String,
}

fn pml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(PML_NS))
}

fn dml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(DML_NS))
}

fn find_descendant<'a>(
    node: roxmltree::Node<'a, 'a>,
    ns: &str,
    name: &str,
) -> Option<roxmltree::Node<'a, 'a>> {
    node.descendants()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(ns))
}

fn parse_geom(shape_node: roxmltree::Node) -> Option<Geom> {
    let xfrm = find_descendant(shape_node, DML_NS, "xfrm")?;
    let off = dml(xfrm, "off")?;
    let ext = dml(xfrm, "ext")?;
    Some(Geom {
        x: off.attribute("x")?.parse().ok()?,
        y: off.attribute("y")?.parse().ok()?,
        cx: ext.attribute("cx")?.parse().ok()?,
        cy: ext.attribute("cy")?.parse().ok()?,
    })
}

impl Shape {
    /// Build a shape handle from a node of a parsed slide document.
    pub fn from_node(slide_xml: &str, node: roxmltree::Node) -> Self {
        let cnvpr = find_descendant(node, PML_NS, "cNvPr");
        Self {
            xml: slide_xml[node.range()].to_string(),
            name: cnvpr
                .and_then(|n| n.attribute("name"))
                .unwrap_or_default()
                .to_string(),
            id: cnvpr
                .and_then(|n| n.attribute("id"))
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            geom: parse_geom(node),
            kind: node.tag_name().name().to_string(),
        }
    }

    pub fn is_text_shape(&self) -> bool {
        self.kind == "sp"
    }

    /// First-run formatting of the prototype, for clones to inherit.
    pub fn run_format(&self) -> RunFormat {
        let wrapped = format!("{WRAP_OPEN}{}{WRAP_CLOSE}", self.xml);
        let Ok(doc) = roxmltree::Document::parse(&wrapped) else {
            return RunFormat::default();
        };
        let root = doc.root_element();
        let Some(shape) = root.first_element_child() else {
            return RunFormat::default();
        };
        find_descendant(shape, DML_NS, "rPr")
            .map(|rpr| RunFormat::from_rpr(&wrapped, rpr))
            .unwrap_or_default()
    }

    pub fn font_size_pt(&self) -> f32 {
        self.run_format().font_size_pt()
    }

    /// Clone with a fresh identity, keeping everything else untouched.
    /// Works for any shape kind; falls back to the unmodified fragment
    /// when the XML cannot be reparsed.
    pub fn with_identity(&self, id: u64, name: &str) -> Self {
        let wrapped = format!("{WRAP_OPEN}{}{WRAP_CLOSE}", self.xml);
        let xml = rewrite_cnvpr(&wrapped, id, name).unwrap_or_else(|| {
            log::warn!("Could not rewrite identity of shape '{}'", self.name);
            self.xml.clone()
        });
        Self {
            xml,
            name: name.to_string(),
            id,
            geom: self.geom,
            kind: self.kind.clone(),
        }
    }

    /// Rebuild this shape with new text (and optionally a new position),
    /// keeping the template's shape properties, style, body properties
    /// and first-run formatting.
    pub fn set_text(&mut self, paras: &[Para]) {
        self.rebuild(self.id, &self.name.clone(), None, paras);
    }

    /// Clone onto a new identity/position with new text.
    pub fn filled(&self, id: u64, name: &str, geom: Option<Geom>, paras: &[Para]) -> Self {
        let mut clone = self.clone();
        clone.rebuild(id, name, geom, paras);
        clone
    }

    fn rebuild(&mut self, id: u64, name: &str, geom: Option<Geom>, paras: &[Para]) {
        if !self.is_text_shape() {
            log::warn!(
                "Shape '{}' is a {} and cannot hold text; keeping it as-is",
                self.name,
                self.kind
            );
            *self = self.with_identity(id, name);
            return;
        }

        let wrapped = format!("{WRAP_OPEN}{}{WRAP_CLOSE}", self.xml);
        match rebuild_sp(&wrapped, id, name, geom, paras) {
            Ok(xml) => {
                self.xml = xml;
                self.name = name.to_string();
                self.id = id;
                if let Some(g) = geom {
                    self.geom = Some(g);
                }
            }
            Err(e) => log::warn!("Could not rebuild shape '{}': {e}", self.name),
        }
    }
}

/// Replace the `p:cNvPr` identity, preserving its other attributes and
/// children, and return the new fragment.
fn rewrite_cnvpr(wrapped: &str, id: u64, name: &str) -> Option<String> {
    let doc = roxmltree::Document::parse(wrapped).ok()?;
    let shape = doc.root_element().first_element_child()?;
    let cnvpr = find_descendant(shape, PML_NS, "cNvPr")?;

    let mut attrs = format!(r#" id="{id}" name="{}""#, escape_xml(name));
    for attr in cnvpr.attributes() {
        if attr.name() != "id" && attr.name() != "name" {
            let _ = write!(attrs, r#" {}="{}""#, attr.name(), escape_xml(attr.value()));
        }
    }

    let inner: String = cnvpr
        .children()
        .filter(|n| n.is_element())
        .map(|n| &wrapped[n.range()])
        .collect();
    let replacement = if inner.is_empty() {
        format!("<p:cNvPr{attrs}/>")
    } else {
        format!("<p:cNvPr{attrs}>{inner}</p:cNvPr>")
    };

    let range = cnvpr.range();
    let out = format!(
        "{}{}{}",
        &wrapped[..range.start],
        replacement,
        &wrapped[range.end..]
    );
    Some(out[WRAP_OPEN.len()..out.len() - WRAP_CLOSE.len()].to_string())
}

fn rebuild_sp(
    wrapped: &str,
    id: u64,
    name: &str,
    geom: Option<Geom>,
    paras: &[Para],
) -> Result<String, Error> {
    let doc = roxmltree::Document::parse(wrapped)
        .map_err(|e| Error::BadTemplate(format!("unparsable shape fragment: {e}")))?;
    let sp = doc
        .root_element()
        .first_element_child()
        .ok_or_else(|| Error::BadTemplate(String::from("empty shape fragment")))?;

    let nvsppr = pml(sp, "nvSpPr");
    let slice = |node: roxmltree::Node| wrapped[node.range()].to_string();

    let cnvsppr = nvsppr
        .and_then(|n| pml(n, "cNvSpPr"))
        .map(&slice)
        .unwrap_or_else(|| String::from("<p:cNvSpPr/>"));
    let nvpr = nvsppr
        .and_then(|n| pml(n, "nvPr"))
        .map(&slice)
        .unwrap_or_else(|| String::from("<p:nvPr/>"));

    let sppr = match (pml(sp, "spPr"), geom) {
        (Some(node), Some(g)) => sppr_with_geom(wrapped, node, g),
        (Some(node), None) => slice(node),
        (None, Some(g)) => format!("<p:spPr>{}</p:spPr>", emit_xfrm(g)),
        (None, None) => String::from("<p:spPr/>"),
    };
    let style = pml(sp, "style").map(&slice).unwrap_or_default();

    let txbody = pml(sp, "txBody");
    let bodypr = txbody
        .and_then(|n| dml(n, "bodyPr"))
        .map(&slice)
        .unwrap_or_else(|| String::from("<a:bodyPr/>"));
    let lststyle = txbody
        .and_then(|n| dml(n, "lstStyle"))
        .map(&slice)
        .unwrap_or_else(|| String::from("<a:lstStyle/>"));
    let first_para = txbody.and_then(|n| dml(n, "p"));
    let first_ppr = first_para.and_then(|p| dml(p, "pPr")).map(&slice);
    let format = txbody
        .and_then(|n| find_descendant(n, DML_NS, "rPr"))
        .map(|rpr| RunFormat::from_rpr(wrapped, rpr))
        .unwrap_or_default();

    let mut paragraphs = String::new();
    for para in paras {
        let ppr = if para.level > 0 {
            format!(r#"<a:pPr lvl="{}"/>"#, para.level)
        } else {
            first_ppr.clone().unwrap_or_default()
        };
        let _ = write!(
            paragraphs,
            "<a:p>{ppr}<a:r>{}<a:t>{}</a:t></a:r></a:p>",
            format.emit_rpr(para.bold),
            escape_xml(&para.text)
        );
    }
    if paras.is_empty() {
        paragraphs.push_str("<a:p/>");
    }

    Ok(format!(
        "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"{}\"/>{cnvsppr}{nvpr}</p:nvSpPr>\
         {sppr}{style}<p:txBody>{bodypr}{lststyle}{paragraphs}</p:txBody></p:sp>",
        escape_xml(name)
    ))
}

fn emit_xfrm(g: Geom) -> String {
    format!(
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        g.x, g.y, g.cx, g.cy
    )
}

/// Re-emit an spPr fragment with the given offsets/extents, preserving
/// everything else (preset geometry, fills, lines).
fn sppr_with_geom(wrapped: &str, sppr: roxmltree::Node, g: Geom) -> String {
    let range = sppr.range();
    match dml(sppr, "xfrm") {
        Some(xfrm) => {
            // Replace the whole a:xfrm, keeping any rotation attribute.
            let mut attrs = String::new();
            for attr in xfrm.attributes() {
                let _ = write!(attrs, r#" {}="{}""#, attr.name(), escape_xml(attr.value()));
            }
            let replacement = format!(
                r#"<a:xfrm{attrs}><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
                g.x, g.y, g.cx, g.cy
            );
            let xr = xfrm.range();
            format!(
                "{}{}{}",
                &wrapped[range.start..xr.start],
                replacement,
                &wrapped[xr.end..range.end]
            )
        }
        None => {
            let mut attrs = String::new();
            for attr in sppr.attributes() {
                let _ = write!(attrs, r#" {}="{}""#, attr.name(), escape_xml(attr.value()));
            }
            let inner: String = sppr
                .children()
                .filter(|n| n.is_element())
                .map(|n| &wrapped[n.range()])
                .collect();
            format!("<p:spPr{attrs}>{}{inner}</p:spPr>", emit_xfrm(g))
        }
    }
}

const SHAPE_TAGS: [&str; 5] = ["sp", "pic", "graphicFrame", "grpSp", "cxnSp"];

/// A slide part split into the spTree preamble, its shapes, and the
/// trailing XML, so shapes can be edited, cloned and appended freely and
/// the part re-serialized.
pub(super) struct SlideXml {
    header: String,
    footer: String,
    pub shapes: Vec<Shape>,
}

impl SlideXml {
    pub fn parse(xml: &str) -> Result<Self, Error> {
        let doc = roxmltree::Document::parse(xml)?;
        let sptree = doc
            .descendants()
            .find(|n| n.tag_name().name() == "spTree" && n.tag_name().namespace() == Some(PML_NS))
            .ok_or_else(|| Error::BadTemplate(String::from("slide has no p:spTree")))?;

        let children: Vec<roxmltree::Node> =
            sptree.children().filter(|n| n.is_element()).collect();
        let first_shape = children.iter().position(|n| {
            n.tag_name().namespace() == Some(PML_NS)
                && SHAPE_TAGS.contains(&n.tag_name().name())
        });

        match first_shape {
            Some(idx) => {
                let start = children[idx].range().start;
                let end = children.last().unwrap().range().end;
                Ok(Self {
                    header: xml[..start].to_string(),
                    footer: xml[end..].to_string(),
                    shapes: children[idx..]
                        .iter()
                        .map(|n| Shape::from_node(xml, *n))
                        .collect(),
                })
            }
            None => {
                // Only the group-shape preamble; new shapes append at the
                // end of the spTree content.
                let end = children
                    .last()
                    .map(|n| n.range().end)
                    .ok_or_else(|| Error::BadTemplate(String::from("empty p:spTree")))?;
                Ok(Self {
                    header: xml[..end].to_string(),
                    footer: xml[end..].to_string(),
                    shapes: Vec::new(),
                })
            }
        }
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(
            self.header.len()
                + self.footer.len()
                + self.shapes.iter().map(|s| s.xml.len()).sum::<usize>(),
        );
        out.push_str(&self.header);
        for shape in &self.shapes {
            out.push_str(&shape.xml);
        }
        out.push_str(&self.footer);
        out
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.shapes.iter().position(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SP: &str = concat!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="4" name="page1_bullet1"/>"#,
        r#"<p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
        r#"<p:spPr><a:xfrm><a:off x="457200" y="2743200"/>"#,
        r#"<a:ext cx="8229600" cy="3657600"/></a:xfrm>"#,
        r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#,
        r#"<p:txBody><a:bodyPr wrap="square"/><a:lstStyle/>"#,
        r#"<a:p><a:r><a:rPr lang="en-US" sz="1800" b="0">"#,
        r#"<a:solidFill><a:srgbClr val="333333"/></a:solidFill>"#,
        r#"<a:latin typeface="Calibri"/></a:rPr>"#,
        r#"<a:t>Content Body Placeholder</a:t></a:r></a:p></p:txBody></p:sp>"#
    );

    fn slide(body: &str) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#,
                r#" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main""#,
                r#" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
                r#"<p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/>"#,
                r#"<p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#,
                "{body}",
                r#"</p:spTree></p:cSld></p:sld>"#
            ),
            body = body
        )
    }

    #[test]
    fn parses_shape_metadata() {
        let xml = slide(SP);
        let parsed = SlideXml::parse(&xml).unwrap();
        assert_eq!(parsed.shapes.len(), 1);
        let shape = &parsed.shapes[0];
        assert_eq!(shape.name, "page1_bullet1");
        assert_eq!(shape.id, 4);
        let geom = shape.geom.unwrap();
        assert_eq!(geom.x, 457_200);
        assert_eq!(geom.cy, 3_657_600);
        assert_eq!(shape.font_size_pt(), 18.0);
    }

    #[test]
    fn roundtrip_without_edits_is_identical() {
        let xml = slide(SP);
        let parsed = SlideXml::parse(&xml).unwrap();
        assert_eq!(parsed.to_xml(), xml);
    }

    #[test]
    fn set_text_keeps_formatting_and_escapes() {
        let xml = slide(SP);
        let mut parsed = SlideXml::parse(&xml).unwrap();
        parsed.shapes[0].set_text(&[
            Para::bold("R&D Plan"),
            Para::bullet("Phase <1>"),
        ]);
        let out = parsed.shapes[0].xml.clone();
        assert!(out.contains("<a:t>R&amp;D Plan</a:t>"));
        assert!(out.contains("<a:t>Phase &lt;1&gt;</a:t>"));
        assert!(out.contains(r#"b="1""#));
        assert!(out.contains(r#"<a:pPr lvl="1"/>"#));
        assert!(out.contains(r#"sz="1800""#));
        assert!(out.contains(r#"<a:latin typeface="Calibri"/>"#));
        // East-asian face follows latin when the template declares none.
        assert!(out.contains(r#"<a:ea typeface="Calibri"/>"#));
        assert!(out.contains(r#"<a:srgbClr val="333333"/>"#));
        // Geometry untouched.
        assert!(out.contains(r#"<a:off x="457200" y="2743200"/>"#));
    }

    #[test]
    fn filled_clone_renames_and_moves() {
        let xml = slide(SP);
        let parsed = SlideXml::parse(&xml).unwrap();
        let clone = parsed.shapes[0].filled(
            99,
            "page3_bullet1",
            Some(Geom {
                x: 100,
                y: 200,
                cx: 300,
                cy: 400,
            }),
            &[Para::plain("hello")],
        );
        assert_eq!(clone.name, "page3_bullet1");
        assert_eq!(clone.id, 99);
        assert!(clone.xml.contains(r#"<p:cNvPr id="99" name="page3_bullet1"/>"#));
        assert!(clone.xml.contains(r#"<a:off x="100" y="200"/>"#));
        assert!(clone.xml.contains(r#"<a:ext cx="300" cy="400"/>"#));
        assert!(clone.xml.contains(r#"<a:prstGeom prst="rect">"#));
        // Original untouched.
        assert!(parsed.shapes[0].xml.contains("Content Body Placeholder"));
    }

    #[test]
    fn identity_rewrite_preserves_other_attributes() {
        let pic = r#"<p:pic><p:nvPicPr><p:cNvPr id="7" name="logo" descr="corp logo"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/></p:blipFill><p:spPr/></p:pic>"#;
        let xml = slide(pic);
        let parsed = SlideXml::parse(&xml).unwrap();
        let clone = parsed.shapes[0].with_identity(42, "logo_copy");
        assert!(clone.xml.contains(r#"id="42""#));
        assert!(clone.xml.contains(r#"name="logo_copy""#));
        assert!(clone.xml.contains(r#"descr="corp logo""#));
        assert!(clone.xml.contains(r#"r:embed="rId2""#));
    }
}
