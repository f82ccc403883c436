//! RcDoc-based pretty-printer with termcolor annotations for [`Expr`].
//!
//! Role
//! - Convert an `Expr` into an annotated document in one of the [`PrettyMode`]s.
//! - Provide colored output for terminals (TTY-aware) and plain strings for logs, errors and
//!   tests.
//!
//! Modes
//! - `Minimum` prints payloads only. Used by error messages.
//! - `Readable` annotates higher orders (`x:i32`), omitting unspecified and fourth ones.
//! - `Strict` prefixes every tagged node with its variant and annotates every higher order.
//! - The `*All` variants also annotate the higher orders of printed higher orders.
//!
//! Documents only contain hard spaces, so the output never wraps and is deterministic.

use std::{
    fmt,
    io::{self, Write},
};

use pretty::{FmtWrite, RcDoc, RenderAnnotated};
use serde::Deserialize;
use strum::{Display, EnumIter};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::expr::{Expr, ExprKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrettyMode {
    #[default]
    Minimum,
    Readable,
    ReadableAll,
    Strict,
    StrictAll,
}

impl PrettyMode {
    pub fn is_strict(self) -> bool {
        matches!(self, PrettyMode::Strict | PrettyMode::StrictAll)
    }

    /// Whether higher orders of higher orders are printed too.
    pub fn is_all(self) -> bool {
        matches!(self, PrettyMode::ReadableAll | PrettyMode::StrictAll)
    }
}

/// Styles used to annotate parts of the pretty-printed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Punct, // colons
    /// Parentheses are colored by nesting depth so matching pairs share a color.
    Paren(u8),
    Tag,         // variant tags in strict mode
    Operator,    // ->, &&, ||
    Ident,       // variables and members
    Type,        // host types and the kind tower
    Literal,     // constants
    Placeholder, // 'N
}

impl Style {
    fn to_color_spec(self) -> ColorSpec {
        let mut s = ColorSpec::new();
        match self {
            Style::Punct => {
                s.set_dimmed(true);
            }
            Style::Paren(depth) => {
                let fg = match depth % 6 {
                    0 => Color::Blue,
                    1 => Color::Green,
                    2 => Color::White,
                    3 => Color::Yellow,
                    4 => Color::Red,
                    _ => Color::Magenta,
                };
                s.set_fg(Some(fg)).set_dimmed(true);
            }
            Style::Tag => {
                s.set_fg(Some(Color::Cyan)).set_bold(true);
            }
            Style::Operator => {
                s.set_fg(Some(Color::Yellow)).set_bold(true);
            }
            Style::Ident => {
                s.set_fg(Some(Color::Green)).set_bold(true);
            }
            Style::Type => {
                s.set_fg(Some(Color::Magenta));
            }
            Style::Literal => {
                s.set_fg(Some(Color::Blue));
            }
            Style::Placeholder => {
                s.set_fg(Some(Color::Red)).set_italic(true);
            }
        }
        s
    }
}

type Doc = RcDoc<'static, Style>;

fn styled(style: Style, s: impl fmt::Display) -> Doc {
    RcDoc::as_string(s).annotate(style)
}

fn punct(s: &'static str) -> Doc {
    styled(Style::Punct, s)
}

#[inline]
fn lparen(depth: u8) -> Doc {
    RcDoc::as_string("(").annotate(Style::Paren(depth))
}

#[inline]
fn rparen(depth: u8) -> Doc {
    RcDoc::as_string(")").annotate(Style::Paren(depth))
}

fn op(s: &'static str) -> Doc {
    styled(Style::Operator, s)
}

const ARROW: u8 = 1;
const OR: u8 = 2;
const AND: u8 = 3;
const APPLY: u8 = 4;
/// Tagged leaf (strict mode only): needs parentheses as a child, not before `:`.
const LEAF: u8 = 200;
const ATOM: u8 = 255;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

#[derive(Clone, Copy)]
struct Printer {
    mode: PrettyMode,
}

impl Printer {
    fn annotates(&self, expr: &Expr, partial: bool) -> Option<Expr> {
        if partial || self.mode == PrettyMode::Minimum {
            return None;
        }
        let higher_order = expr.higher_order();
        let visible = match higher_order.kind() {
            ExprKind::DeadEnd => false,
            ExprKind::Unspecified => self.mode.is_strict(),
            ExprKind::Fourth => self.mode != PrettyMode::Readable,
            _ => true,
        };
        visible.then_some(higher_order)
    }

    fn shape_precedence(&self, expr: &Expr) -> u8 {
        match expr.kind() {
            ExprKind::Lambda { .. } | ExprKind::Function { .. } => ARROW,
            ExprKind::Or(..) => OR,
            ExprKind::And(..) => AND,
            ExprKind::Apply { .. } | ExprKind::MethodPartialClosure(_) => APPLY,
            ExprKind::Placeholder(_)
            | ExprKind::TypeKind
            | ExprKind::Fourth
            | ExprKind::Unspecified
            | ExprKind::DeadEnd => ATOM,
            _ if self.mode.is_strict() => LEAF,
            _ => ATOM,
        }
    }

    fn precedence(&self, expr: &Expr, partial: bool) -> u8 {
        match self.annotates(expr, partial) {
            Some(_) if self.mode.is_strict() => LEAF,
            Some(_) => ATOM,
            None => self.shape_precedence(expr),
        }
    }

    fn needs_parens(&self, child: &Expr, parent: u8, side: Side) -> bool {
        let current = self.precedence(child, false);
        if self.mode.is_strict() {
            return current < ATOM;
        }
        match parent {
            ARROW => current < ARROW || (current == ARROW && side == Side::Left),
            APPLY => current < APPLY || (current == APPLY && side == Side::Right),
            _ => current < parent,
        }
    }

    fn child(&self, child: &Expr, parent: u8, side: Side, depth: u8) -> Doc {
        if self.needs_parens(child, parent, side) {
            lparen(depth)
                .append(self.to_doc(child, false, depth + 1))
                .append(rparen(depth))
                .group()
        } else {
            self.to_doc(child, false, depth)
        }
    }

    fn tagged(&self, tag: &'static str, body: Doc) -> Doc {
        if self.mode.is_strict() {
            styled(Style::Tag, tag).append(RcDoc::space()).append(body)
        } else {
            body
        }
    }

    fn binary(
        &self,
        tag: &'static str,
        symbol: &'static str,
        precedence: u8,
        (left, right): (&Expr, &Expr),
        depth: u8,
    ) -> Doc {
        let body = self
            .child(left, precedence, Side::Left, depth)
            .append(RcDoc::space())
            .append(op(symbol))
            .append(RcDoc::space())
            .append(self.child(right, precedence, Side::Right, depth));
        self.tagged(tag, body).group()
    }

    fn body_doc(&self, expr: &Expr, depth: u8) -> Doc {
        match expr.kind() {
            ExprKind::Variable(symbol) => self.tagged("Variable", styled(Style::Ident, symbol)),
            ExprKind::BoundVariable(symbol) => {
                self.tagged("BoundVariable", styled(Style::Ident, symbol))
            }
            ExprKind::Constant(value) => self.tagged("Constant", styled(Style::Literal, value)),
            ExprKind::Type(ty) => self.tagged("Type", styled(Style::Type, ty)),
            ExprKind::Method(method) => self.tagged("Method", styled(Style::Ident, method.name())),
            ExprKind::MethodBinder(method) => {
                self.tagged("MethodBinder", styled(Style::Ident, method.name()))
            }
            ExprKind::Property(property) => {
                self.tagged("Property", styled(Style::Ident, property.name()))
            }
            ExprKind::MethodPartialClosure(partial) => {
                let body = partial.arguments().iter().fold(
                    styled(Style::Ident, partial.method().name()),
                    |doc, argument| {
                        doc.append(RcDoc::space())
                            .append(styled(Style::Literal, argument))
                    },
                );
                self.tagged("MethodPartialClosure", body).group()
            }
            ExprKind::Placeholder(index) => styled(Style::Placeholder, index),
            ExprKind::TypeKind => styled(Style::Type, "*"),
            ExprKind::Fourth => styled(Style::Type, "#"),
            ExprKind::Unspecified => styled(Style::Type, "_"),
            ExprKind::DeadEnd => styled(Style::Type, "#DE"),
            ExprKind::Lambda { parameter, body } => {
                self.binary("Lambda", "->", ARROW, (parameter, body), depth)
            }
            ExprKind::Function { parameter, result } => {
                self.binary("Function", "->", ARROW, (parameter, result), depth)
            }
            ExprKind::Apply { function, argument } => {
                let body = self
                    .child(function, APPLY, Side::Left, depth)
                    .append(RcDoc::space())
                    .append(self.child(argument, APPLY, Side::Right, depth));
                self.tagged("Apply", body).group()
            }
            ExprKind::And(left, right) => self.binary("And", "&&", AND, (left, right), depth),
            ExprKind::Or(left, right) => self.binary("Or", "||", OR, (left, right), depth),
        }
    }

    /// `partial` suppresses the higher order annotation of this node.
    fn to_doc(&self, expr: &Expr, partial: bool, depth: u8) -> Doc {
        let Some(higher_order) = self.annotates(expr, partial) else {
            return self.body_doc(expr, depth);
        };

        let body = if self.shape_precedence(expr) < LEAF {
            lparen(depth)
                .append(self.body_doc(expr, depth + 1))
                .append(rparen(depth))
        } else {
            self.body_doc(expr, depth)
        };

        let nested_partial = !self.mode.is_all();
        let annotation = if self.precedence(&higher_order, nested_partial) < ATOM {
            lparen(depth)
                .append(self.to_doc(&higher_order, nested_partial, depth + 1))
                .append(rparen(depth))
        } else {
            self.to_doc(&higher_order, nested_partial, depth)
        };

        body.append(punct(":")).append(annotation).group()
    }
}

// A writer that maps Style annotations to termcolor ColorSpec on a WriteColor sink.
struct ColorWriter<'w, W: WriteColor + Write> {
    out: &'w mut W,
}

impl<'a, 'w, W: WriteColor + Write> RenderAnnotated<'a, Style> for ColorWriter<'w, W> {
    fn push_annotation(&mut self, ann: &'a Style) -> io::Result<()> {
        self.out.set_color(&ann.to_color_spec())
    }
    fn pop_annotation(&mut self) -> io::Result<()> {
        self.out.reset()
    }
}

impl<'w, W: WriteColor + Write> pretty::Render for ColorWriter<'w, W> {
    type Error = io::Error;
    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        self.out.write_all(s.as_bytes())?;
        Ok(s.len())
    }
    fn write_str_all(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(s.as_bytes())
    }
    fn fail_doc(&self) -> Self::Error {
        io::Error::other("render failed")
    }
}

fn render_to<W: WriteColor + Write>(doc: &Doc, width: usize, out: &mut W) -> io::Result<()> {
    let mut cw = ColorWriter { out };
    doc.render_raw(width, &mut cw)
}

/// Retrieve the width of the terminal, or 80 if it cannot be determined.
fn terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

pub(crate) fn render_fmt(expr: &Expr, mode: PrettyMode, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut w = FmtWrite::new(f);
    expr.pretty_doc(mode).render_raw(80, &mut w)
}

/// Pretty-printing conveniences for expressions.
pub trait PrettyExpr {
    /// Build an RcDoc representation of this expression with style annotations.
    fn pretty_doc(&self, mode: PrettyMode) -> Doc;

    /// Render with colors to any termcolor writer at the given width.
    fn pretty_render_to<W: WriteColor + Write>(
        &self,
        mode: PrettyMode,
        width: usize,
        out: &mut W,
    ) -> io::Result<()>;

    /// Print to stdout with colors (TTY-aware).
    fn pretty_print(&self, mode: PrettyMode) -> io::Result<()>;

    /// Format into a plain string (no colors).
    fn pretty_string(&self, mode: PrettyMode) -> String;
}

impl PrettyExpr for Expr {
    #[inline]
    fn pretty_doc(&self, mode: PrettyMode) -> Doc {
        Printer { mode }.to_doc(self, false, 0)
    }

    fn pretty_render_to<W: WriteColor + Write>(
        &self,
        mode: PrettyMode,
        width: usize,
        out: &mut W,
    ) -> io::Result<()> {
        render_to(&self.pretty_doc(mode), width, out)
    }

    fn pretty_print(&self, mode: PrettyMode) -> io::Result<()> {
        let stdout = StandardStream::stdout(ColorChoice::Auto);
        let mut stdout = stdout.lock();
        self.pretty_render_to(mode, terminal_width(), &mut stdout)?;
        writeln!(stdout)
    }

    fn pretty_string(&self, mode: PrettyMode) -> String {
        let mut buf = String::new();
        let _ = self.pretty_doc(mode).render_fmt(80, &mut buf);
        buf
    }
}
