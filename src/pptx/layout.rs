//! Offset heuristics for dynamically generated text boxes.
//!
//! There is no text shaping here: heights come from a character-count
//! estimate against the box width, stacking steps come from prototype
//! geometry. Good enough to keep cloned boxes from overlapping; exact
//! typesetting stays PowerPoint's job.

pub(super) const EMU_PER_INCH: i64 = 914_400;
pub(super) const EMU_PER_PT: i64 = 12_700;

pub(super) const DEFAULT_FONT_PT: f32 = 18.0;

// Average latin glyph advance as a fraction of the font size; wide (CJK,
// fullwidth) glyphs relative to that.
const AVG_ADVANCE: f32 = 0.55;
const WIDE_FACTOR: f32 = 1.9;
const LINE_PITCH: f32 = 1.25;

// Stacking step when only a single prototype gives us geometry.
const STACK_FACTOR: f32 = 1.5;

pub(super) fn inches_to_emu(inches: f32) -> i64 {
    (inches * EMU_PER_INCH as f32) as i64
}

pub(super) fn pt_to_emu(pt: f32) -> i64 {
    (pt * EMU_PER_PT as f32) as i64
}

pub(super) fn emu_to_pt(emu: i64) -> f32 {
    emu as f32 / EMU_PER_PT as f32
}

fn is_wide(c: char) -> bool {
    matches!(c,
        '\u{1100}'..='\u{115F}'   // Hangul Jamo
        | '\u{2E80}'..='\u{303E}' // CJK radicals, punctuation
        | '\u{3041}'..='\u{33FF}' // kana, compatibility
        | '\u{3400}'..='\u{4DBF}' // CJK ext A
        | '\u{4E00}'..='\u{9FFF}' // CJK unified
        | '\u{A000}'..='\u{A4CF}'
        | '\u{AC00}'..='\u{D7A3}' // Hangul syllables
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FE30}'..='\u{FE4F}'
        | '\u{FF00}'..='\u{FF60}' // fullwidth forms
        | '\u{FFE0}'..='\u{FFE6}')
}

fn char_units(text: &str) -> f32 {
    text.chars()
        .map(|c| if is_wide(c) { WIDE_FACTOR } else { 1.0 })
        .sum()
}

/// Wrapped line count for one explicit line of text in a box of the
/// given width. At least one line, even when empty.
fn wrapped_lines(line: &str, width_pt: f32, font_size_pt: f32) -> u32 {
    let per_line = (width_pt / (font_size_pt * AVG_ADVANCE)).max(1.0);
    (char_units(line) / per_line).ceil().max(1.0) as u32
}

/// Estimated rendered height of `text` in a box `width` EMU wide.
pub(super) fn estimate_text_height(text: &str, width: i64, font_size_pt: f32) -> i64 {
    let width_pt = emu_to_pt(width);
    let lines: u32 = text
        .lines()
        .map(|line| wrapped_lines(line, width_pt, font_size_pt))
        .sum::<u32>()
        .max(1);
    pt_to_emu(lines as f32 * font_size_pt * LINE_PITCH)
}

/// Vertical step between stacked clones. The gap between two authored
/// prototypes wins; a lone prototype falls back to its own height.
pub(super) fn stack_step(proto_y: i64, proto_height: i64, next_proto_y: Option<i64>) -> i64 {
    match next_proto_y {
        Some(next_y) if next_y > proto_y => next_y - proto_y,
        _ => (proto_height as f32 * STACK_FACTOR) as i64,
    }
}

/// X offset for item `index` of `count` items spread evenly across
/// `usable_width`, anchored at the prototype's x.
pub(super) fn distribute_x(proto_x: i64, usable_width: i64, count: usize, index: usize) -> i64 {
    if count == 0 {
        return proto_x;
    }
    proto_x + usable_width / count as i64 * index as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_latin_text_is_one_line() {
        let width = inches_to_emu(9.0);
        let h = estimate_text_height("Milestones", width, 18.0);
        assert_eq!(h, pt_to_emu(18.0 * 1.25));
    }

    #[test]
    fn long_text_wraps() {
        let width = inches_to_emu(3.0); // 216 pt, ~21 chars at 18 pt
        let text = "a".repeat(50);
        let h = estimate_text_height(&text, width, 18.0);
        assert!(h > pt_to_emu(2.0 * 18.0 * 1.25) - 1);
        assert!(h < pt_to_emu(4.0 * 18.0 * 1.25));
    }

    #[test]
    fn cjk_counts_wider_than_latin() {
        let width = inches_to_emu(3.0);
        let latin = estimate_text_height(&"a".repeat(30), width, 18.0);
        let cjk = estimate_text_height(&"汉".repeat(30), width, 18.0);
        assert!(cjk > latin);
    }

    #[test]
    fn explicit_newlines_add_lines() {
        let width = inches_to_emu(9.0);
        let one = estimate_text_height("first", width, 18.0);
        let three = estimate_text_height("first\nsecond\nthird", width, 18.0);
        assert_eq!(three, one * 3);
    }

    #[test]
    fn stack_step_prefers_prototype_gap() {
        let y1 = inches_to_emu(2.0);
        let y2 = inches_to_emu(2.75);
        let h = inches_to_emu(0.5);
        assert_eq!(stack_step(y1, h, Some(y2)), y2 - y1);
        assert_eq!(stack_step(y1, h, None), (h as f32 * 1.5) as i64);
    }

    #[test]
    fn distribute_spreads_evenly() {
        let x0 = inches_to_emu(0.5);
        let usable = inches_to_emu(9.0);
        assert_eq!(distribute_x(x0, usable, 3, 0), x0);
        let third = usable / 3;
        assert_eq!(distribute_x(x0, usable, 3, 2), x0 + 2 * third);
    }
}
