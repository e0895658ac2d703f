//! Static font-metric tables for the two base-14 fonts the resume uses.
//!
//! Widths are in em units (glyph advance / 1000 from the Adobe AFM files), so
//! a string's width in points is `measure_str(s) * font_size`. Because the
//! fonts are standard Type1 fonts every PDF viewer ships, the tables are exact
//! for ASCII; anything outside 0x20..=0x7E falls back to `average_char_width`.
//! Index = (char as usize) - 32.

/// Fonts referenced by the page content streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontFace {
    Regular,
    Bold,
}

impl FontFace {
    /// Resource name used in the page `/Font` dictionary.
    pub fn resource_name(self) -> &'static str {
        match self {
            FontFace::Regular => "F1",
            FontFace::Bold => "F2",
        }
    }

    /// PostScript name of the standard font.
    pub fn base_font(self) -> &'static str {
        match self {
            FontFace::Regular => "Helvetica",
            FontFace::Bold => "Helvetica-Bold",
        }
    }

    pub fn metrics(self) -> &'static FontMetricTable {
        match self {
            FontFace::Regular => &HELVETICA_TABLE,
            FontFace::Bold => &HELVETICA_BOLD_TABLE,
        }
    }
}

/// Static character-width table for one font.
pub struct FontMetricTable {
    widths: [f32; 95],
    /// Fallback width for non-ASCII characters (codepoints > 0x7E).
    pub average_char_width: f32,
    pub space_width: f32,
}

/// ASCII stand-in for a character the WinAnsi fonts cannot draw. The PDF
/// writer emits this text, so widths are measured on it too.
pub fn ascii_substitute(c: char) -> Option<&'static str> {
    match c {
        '₹' => Some("Rs."),
        _ => None,
    }
}

impl FontMetricTable {
    /// Measures the rendered width of a string in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars()
            .map(|c| match ascii_substitute(c) {
                Some(sub) => sub.chars().map(|c| self.char_width(c)).sum(),
                None => self.char_width(c),
            })
            .sum()
    }

    fn char_width(&self, c: char) -> f32 {
        let code = c as usize;
        if (32..=126).contains(&code) {
            self.widths[code - 32]
        } else {
            self.average_char_width
        }
    }

    /// Width of `s` in points at `size_pt`.
    pub fn width_pt(&self, s: &str, size_pt: f32) -> f32 {
        self.measure_str(s) * size_pt
    }

    /// Greedy word-wrap of `s` into lines no wider than `max_width_pt`.
    ///
    /// Whitespace runs collapse to single spaces. A single word wider than the
    /// line is placed on its own line rather than split.
    pub fn wrap(&self, s: &str, size_pt: f32, max_width_pt: f32) -> Vec<String> {
        let max_width = max_width_pt / size_pt;
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in s.split_whitespace() {
            let word_w = self.measure_str(word);
            if current.is_empty() {
                current.push_str(word);
                current_width = word_w;
            } else if current_width + self.space_width + word_w > max_width {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_w;
            } else {
                current.push(' ');
                current.push_str(word);
                current_width += self.space_width + word_w;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.556,
    space_width: 0.278,
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.333, 0.474, 0.556, 0.556, 0.889, 0.722, 0.238, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.333, 0.333, 0.584, 0.584, 0.584, 0.611, 0.975,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.722, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.556, 0.722, 0.611, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.584, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.611, 0.556, 0.611, 0.556, 0.333, 0.611, 0.611, 0.278, 0.278, 0.556, 0.278, 0.889,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.611, 0.611, 0.611, 0.611, 0.389, 0.556, 0.333, 0.611, 0.556, 0.778, 0.556, 0.556, 0.500,
        // {      |      }      ~
        0.389, 0.280, 0.389, 0.584,
    ],
    average_char_width: 0.611,
    space_width: 0.278,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rupee_measures_as_its_substitute() {
        let table = FontFace::Regular.metrics();
        assert_eq!(table.measure_str("₹12 LPA"), table.measure_str("Rs.12 LPA"));
        assert!(table.measure_str("₹") > table.average_char_width);
    }

    #[test]
    fn test_measure_known_string() {
        let table = FontFace::Regular.metrics();
        // "Hi" = H(0.722) + i(0.222)
        assert!((table.measure_str("Hi") - 0.944).abs() < 1e-4);
    }

    #[test]
    fn test_non_ascii_uses_average_width() {
        let table = FontFace::Regular.metrics();
        assert!((table.measure_str("₹") - table.average_char_width).abs() < 1e-6);
    }

    #[test]
    fn test_bold_is_never_narrower_for_lowercase() {
        let regular = FontFace::Regular.metrics();
        let bold = FontFace::Bold.metrics();
        let s = "abcdefghijklmnopqrstuvwxy";
        assert!(bold.measure_str(s) >= regular.measure_str(s));
    }

    #[test]
    fn test_wrap_respects_width() {
        let table = FontFace::Regular.metrics();
        let text = "Architected a distributed caching layer that reduced p99 latency by forty percent";
        let lines = table.wrap(text, 10.0, 150.0);
        assert!(lines.len() > 1);
        for line in &lines {
            // single words may overflow, multi-word lines must not
            if line.contains(' ') {
                assert!(table.width_pt(line, 10.0) <= 150.0 + 1e-3, "{line}");
            }
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_keeps_oversized_word_whole() {
        let table = FontFace::Regular.metrics();
        let lines = table.wrap("supercalifragilisticexpialidocious", 12.0, 20.0);
        assert_eq!(lines, vec!["supercalifragilisticexpialidocious".to_string()]);
    }

    #[test]
    fn test_wrap_empty_string_yields_no_lines() {
        assert!(FontFace::Bold.metrics().wrap("   ", 12.0, 100.0).is_empty());
    }
}
