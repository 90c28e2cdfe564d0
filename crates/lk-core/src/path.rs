//! SVG path data → natural bounds, for sizing icons.
//!
//! Built on `winnow` 0.7. The extent covers every end point and control
//! point, which contains the curve (Bézier hull property). Arcs contribute
//! their end points only.

use crate::model::Bounds;
use winnow::ascii::float;
use winnow::combinator::{preceded, repeat};
use winnow::prelude::*;
use winnow::token::{one_of, take_while};

const COMMANDS: [char; 20] = [
    'M', 'm', 'L', 'l', 'H', 'h', 'V', 'v', 'C', 'c', 'S', 's', 'Q', 'q', 'T', 't', 'A', 'a',
    'Z', 'z',
];

/// One command letter with its flat argument list.
#[derive(Debug, Clone, PartialEq)]
struct RawCommand {
    letter: char,
    args: Vec<f64>,
}

fn separator(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_whitespace() || c == ',')
        .void()
        .parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<f64> {
    preceded(separator, float).parse_next(input)
}

fn command(input: &mut &str) -> ModalResult<RawCommand> {
    separator.parse_next(input)?;
    let letter = one_of(COMMANDS).parse_next(input)?;
    let args: Vec<f64> = repeat(0.., number).parse_next(input)?;
    Ok(RawCommand { letter, args })
}

fn path_data(input: &mut &str) -> ModalResult<Vec<RawCommand>> {
    let commands = repeat(0.., command).parse_next(input)?;
    separator.parse_next(input)?;
    Ok(commands)
}

/// Running extent of the visited points.
#[derive(Debug, Default)]
struct Extent {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
    any: bool,
}

impl Extent {
    fn add(&mut self, x: f64, y: f64) {
        if !self.any {
            *self = Extent {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
                any: true,
            };
            return;
        }
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    fn bounds(&self) -> Option<Bounds> {
        self.any.then(|| {
            Bounds::new(
                self.min_x,
                self.min_y,
                self.max_x - self.min_x,
                self.max_y - self.min_y,
            )
        })
    }
}

/// Natural bounds of SVG path data, or `None` if the data does not parse
/// or draws nothing.
pub fn path_bounds(data: &str) -> Option<Bounds> {
    let commands = match path_data.parse(data) {
        Ok(commands) => commands,
        Err(e) => {
            log::debug!("icon path did not parse: {e}");
            return None;
        }
    };

    let mut extent = Extent::default();
    let (mut cx, mut cy) = (0.0, 0.0);
    let (mut start_x, mut start_y) = (0.0, 0.0);

    for cmd in &commands {
        let relative = cmd.letter.is_ascii_lowercase();

        match cmd.letter.to_ascii_uppercase() {
            'M' => {
                for (i, pair) in cmd.args.chunks_exact(2).enumerate() {
                    let (ox, oy) = if relative { (cx, cy) } else { (0.0, 0.0) };
                    cx = ox + pair[0];
                    cy = oy + pair[1];
                    if i == 0 {
                        start_x = cx;
                        start_y = cy;
                    }
                    extent.add(cx, cy);
                }
            }
            'L' | 'T' => {
                for pair in cmd.args.chunks_exact(2) {
                    let (ox, oy) = if relative { (cx, cy) } else { (0.0, 0.0) };
                    cx = ox + pair[0];
                    cy = oy + pair[1];
                    extent.add(cx, cy);
                }
            }
            'H' => {
                for &v in &cmd.args {
                    cx = if relative { cx + v } else { v };
                    extent.add(cx, cy);
                }
            }
            'V' => {
                for &v in &cmd.args {
                    cy = if relative { cy + v } else { v };
                    extent.add(cx, cy);
                }
            }
            'C' | 'S' | 'Q' => {
                let arity = if cmd.letter.eq_ignore_ascii_case(&'C') {
                    6
                } else {
                    4
                };
                for chunk in cmd.args.chunks_exact(arity) {
                    let (ox, oy) = if relative { (cx, cy) } else { (0.0, 0.0) };
                    for pair in chunk.chunks_exact(2) {
                        extent.add(ox + pair[0], oy + pair[1]);
                    }
                    cx = ox + chunk[arity - 2];
                    cy = oy + chunk[arity - 1];
                }
            }
            'A' => {
                for chunk in cmd.args.chunks_exact(7) {
                    let (ox, oy) = if relative { (cx, cy) } else { (0.0, 0.0) };
                    cx = ox + chunk[5];
                    cy = oy + chunk[6];
                    extent.add(cx, cy);
                }
            }
            'Z' => {
                cx = start_x;
                cy = start_y;
            }
            _ => {}
        }
    }

    extent.bounds()
}
