//! Starter template generation.
//!
//! Writes a minimal self-contained 4-slide deck (cover, table of contents,
//! content prototype, end) with the `cover_*` / `page1_*` naming convention
//! already applied, so the generator and the test suite have something to
//! run against when no corporate template is supplied.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use crate::error::Error;
use crate::pptx::layout::inches_to_emu;
use crate::pptx::shapes::escape_xml;

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

struct Font {
    /// Size in centipoints (e.g. 4400 = 44 pt).
    sz: u32,
    bold: bool,
    italic: bool,
    center: bool,
    color: Option<&'static str>,
}

impl Font {
    fn pt(sz: u32) -> Self {
        Self {
            sz: sz * 100,
            bold: false,
            italic: false,
            center: false,
            color: None,
        }
    }

    fn centered(mut self) -> Self {
        self.center = true;
        self
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    fn color(mut self, rgb: &'static str) -> Self {
        self.color = Some(rgb);
        self
    }
}

fn text_box(id: u64, name: &str, text: &str, inches: (f32, f32, f32, f32), font: &Font) -> String {
    let (x, y, w, h) = inches;
    let mut rpr = format!(r#"<a:rPr lang="en-US" sz="{}""#, font.sz);
    if font.bold {
        rpr.push_str(r#" b="1""#);
    }
    if font.italic {
        rpr.push_str(r#" i="1""#);
    }
    rpr.push_str(r#" dirty="0""#);
    match font.color {
        Some(rgb) => {
            let _ = write!(
                rpr,
                r#"><a:solidFill><a:srgbClr val="{rgb}"/></a:solidFill></a:rPr>"#
            );
        }
        None => rpr.push_str("/>"),
    }
    let ppr = if font.center {
        r#"<a:pPr algn="ctr"/>"#
    } else {
        ""
    };

    format!(
        concat!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/>"#,
            r#"<p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
            r#"<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#,
            r#"<p:txBody><a:bodyPr wrap="square"><a:spAutoFit/></a:bodyPr><a:lstStyle/>"#,
            r#"<a:p>{ppr}<a:r>{rpr}<a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#
        ),
        id = id,
        name = escape_xml(name),
        x = inches_to_emu(x),
        y = inches_to_emu(y),
        cx = inches_to_emu(w),
        cy = inches_to_emu(h),
        ppr = ppr,
        rpr = rpr,
        text = escape_xml(text),
    )
}

fn slide_xml(shapes: &[String]) -> String {
    format!(
        concat!(
            "{decl}",
            r#"<p:sld xmlns:p="{p}" xmlns:a="{a}" xmlns:r="{r}">"#,
            r#"<p:cSld><p:spTree>"#,
            r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
            r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
            r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
            "{shapes}",
            r#"</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
        ),
        decl = XML_DECL,
        p = NS_P,
        a = NS_A,
        r = NS_R,
        shapes = shapes.concat(),
    )
}

fn cover_slide() -> String {
    let mut shapes = vec![text_box(
        2,
        "cover_title",
        "Cover Title Placeholder",
        (1.0, 2.0, 8.0, 1.5),
        &Font::pt(44).centered(),
    )];
    let meta_fields = [
        "cover_company",
        "cover_project",
        "cover_presenter",
        "cover_dept",
        "cover_date",
    ];
    for (i, field) in meta_fields.iter().enumerate() {
        shapes.push(text_box(
            3 + i as u64,
            field,
            field,
            (1.0, 4.0 + i as f32 * 0.5, 8.0, 0.5),
            &Font::pt(14).centered(),
        ));
    }
    slide_xml(&shapes)
}

fn toc_slide() -> String {
    slide_xml(&[
        text_box(
            2,
            "toc_header",
            "Table of Contents",
            (0.5, 0.5, 3.0, 1.0),
            &Font::pt(32),
        ),
        text_box(
            3,
            "page1_title_num",
            "01",
            (1.0, 2.0, 1.0, 0.5),
            &Font::pt(24).color("FF0000"),
        ),
        text_box(
            4,
            "page1_title",
            "Chapter Title Prototype",
            (2.2, 2.0, 6.0, 0.5),
            &Font::pt(24),
        ),
    ])
}

fn content_slide() -> String {
    slide_xml(&[
        text_box(
            2,
            "page1_title",
            "Nav Item",
            (0.5, 0.5, 2.0, 0.5),
            &Font::pt(14).bold(),
        ),
        text_box(
            3,
            "page1_desc",
            "Description text goes here...",
            (0.5, 1.5, 9.0, 1.0),
            &Font::pt(12).italic(),
        ),
        text_box(
            4,
            "page1_bullet1",
            "Content Body Placeholder",
            (0.5, 3.0, 9.0, 3.2),
            &Font::pt(18),
        ),
        text_box(
            5,
            "page1_keyword1",
            "Keyword",
            (0.5, 6.4, 3.0, 0.4),
            &Font::pt(12).color("888888"),
        ),
        text_box(
            6,
            "page_num",
            "0",
            (9.2, 7.0, 0.5, 0.4),
            &Font::pt(12),
        ),
    ])
}

fn end_slide() -> String {
    slide_xml(&[
        text_box(
            2,
            "end_title",
            "Thank You",
            (1.0, 3.0, 8.0, 2.0),
            &Font::pt(50).centered(),
        ),
        text_box(
            3,
            "cover_presenter",
            "Presenter Name",
            (1.0, 5.0, 8.0, 1.0),
            &Font::pt(16).centered(),
        ),
    ])
}

fn content_types() -> String {
    let mut overrides = String::new();
    for i in 1..=4 {
        let _ = write!(
            overrides,
            r#"<Override PartName="/ppt/slides/slide{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
        );
    }
    format!(
        concat!(
            "{decl}",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#,
            r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>"#,
            r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#,
            r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#,
            "{overrides}",
            "</Types>"
        ),
        decl = XML_DECL,
        overrides = overrides,
    )
}

fn root_rels() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>"#,
            "</Relationships>"
        ),
        decl = XML_DECL,
    )
}

fn presentation() -> String {
    let mut slide_ids = String::new();
    for i in 0..4u32 {
        let _ = write!(
            slide_ids,
            r#"<p:sldId id="{}" r:id="rId{}"/>"#,
            256 + i,
            2 + i
        );
    }
    format!(
        concat!(
            "{decl}",
            r#"<p:presentation xmlns:p="{p}" xmlns:a="{a}" xmlns:r="{r}">"#,
            r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#,
            r#"<p:sldIdLst>{slide_ids}</p:sldIdLst>"#,
            r#"<p:sldSz cx="9144000" cy="6858000"/>"#,
            r#"<p:notesSz cx="6858000" cy="9144000"/>"#,
            "</p:presentation>"
        ),
        decl = XML_DECL,
        p = NS_P,
        a = NS_A,
        r = NS_R,
        slide_ids = slide_ids,
    )
}

fn presentation_rels() -> String {
    let mut rels = String::from(
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
    );
    for i in 1..=4 {
        let _ = write!(
            rels,
            r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{i}.xml"/>"#,
            1 + i
        );
    }
    format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            "{rels}",
            "</Relationships>"
        ),
        decl = XML_DECL,
        rels = rels,
    )
}

fn slide_master() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<p:sldMaster xmlns:p="{p}" xmlns:a="{a}" xmlns:r="{r}">"#,
            r#"<p:cSld><p:bg><p:bgPr><a:solidFill><a:srgbClr val="FFFFFF"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#,
            r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
            r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
            r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld>"#,
            r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2""#,
            r#" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            r#"<p:txStyles><p:titleStyle/><p:bodyStyle/><p:otherStyle/></p:txStyles>"#,
            "</p:sldMaster>"
        ),
        decl = XML_DECL,
        p = NS_P,
        a = NS_A,
        r = NS_R,
    )
}

fn slide_master_rels() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
            r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/>"#,
            "</Relationships>"
        ),
        decl = XML_DECL,
    )
}

fn slide_layout() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<p:sldLayout xmlns:p="{p}" xmlns:a="{a}" xmlns:r="{r}" type="blank" preserve="1">"#,
            r#"<p:cSld name="Blank"><p:spTree>"#,
            r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
            r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
            r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
            r#"</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
        ),
        decl = XML_DECL,
        p = NS_P,
        a = NS_A,
        r = NS_R,
    )
}

fn slide_layout_rels() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/>"#,
            "</Relationships>"
        ),
        decl = XML_DECL,
    )
}

fn slide_rels() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
            "</Relationships>"
        ),
        decl = XML_DECL,
    )
}

fn theme() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<a:theme xmlns:a="{a}" name="Office Theme"><a:themeElements>"#,
            r#"<a:clrScheme name="Office">"#,
            r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#,
            r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#,
            r#"<a:dk2><a:srgbClr val="44546A"/></a:dk2>"#,
            r#"<a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>"#,
            r#"<a:accent1><a:srgbClr val="4472C4"/></a:accent1>"#,
            r#"<a:accent2><a:srgbClr val="ED7D31"/></a:accent2>"#,
            r#"<a:accent3><a:srgbClr val="A5A5A5"/></a:accent3>"#,
            r#"<a:accent4><a:srgbClr val="FFC000"/></a:accent4>"#,
            r#"<a:accent5><a:srgbClr val="5B9BD5"/></a:accent5>"#,
            r#"<a:accent6><a:srgbClr val="70AD47"/></a:accent6>"#,
            r#"<a:hlink><a:srgbClr val="0563C1"/></a:hlink>"#,
            r#"<a:folHlink><a:srgbClr val="954F72"/></a:folHlink>"#,
            r#"</a:clrScheme>"#,
            r#"<a:fontScheme name="Office">"#,
            r#"<a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
            r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
            r#"</a:fontScheme>"#,
            r#"<a:fmtScheme name="Office">"#,
            r#"<a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
            r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
            r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst>"#,
            r#"<a:lnStyleLst>"#,
            r#"<a:ln w="6350"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
            r#"<a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
            r#"<a:ln w="19050"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
            r#"</a:lnStyleLst>"#,
            r#"<a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle>"#,
            r#"<a:effectStyle><a:effectLst/></a:effectStyle>"#,
            r#"<a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst>"#,
            r#"<a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
            r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#,
            r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:bgFillStyleLst>"#,
            r#"</a:fmtScheme></a:themeElements></a:theme>"#
        ),
        decl = XML_DECL,
        a = NS_A,
    )
}

/// Write the 4-slide starter template to `path`.
pub fn create_demo_template(path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let slides = [cover_slide(), toc_slide(), content_slide(), end_slide()];

    let file = std::fs::File::create(path)?;
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    let mut put = |name: &str, content: String| -> Result<(), Error> {
        writer.start_file(name, options)?;
        writer.write_all(content.as_bytes())?;
        Ok(())
    };

    put("[Content_Types].xml", content_types())?;
    put("_rels/.rels", root_rels())?;
    put("ppt/presentation.xml", presentation())?;
    put("ppt/_rels/presentation.xml.rels", presentation_rels())?;
    put("ppt/slideMasters/slideMaster1.xml", slide_master())?;
    put(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        slide_master_rels(),
    )?;
    put("ppt/slideLayouts/slideLayout1.xml", slide_layout())?;
    put(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        slide_layout_rels(),
    )?;
    put("ppt/theme/theme1.xml", theme())?;
    for (i, slide) in slides.into_iter().enumerate() {
        put(&format!("ppt/slides/slide{}.xml", i + 1), slide)?;
        put(
            &format!("ppt/slides/_rels/slide{}.xml.rels", i + 1),
            slide_rels(),
        )?;
    }
    writer.finish()?;

    log::info!("Demo template created at {}", path.display());
    Ok(())
}
