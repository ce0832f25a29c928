//! HTML-like node labels.
//!
//! Every node is drawn as a Graphviz HTML table: an outer table carrying
//! the fill colour and the landing port, a first inner table with the
//! stereotypes and the name, then one inner table per member section.
//! Outline shapes (`class`, `activeclass`) draw cell borders; the other
//! shapes rely on their Graphviz shape and draw the table borderless.

use trellis_core::model::{Field, Method, Tag, TypeDecl, TypeRef, Visibility};
use trellis_parser::tags::{parse_stereotype, parse_tag_value};

use crate::{
    diagram::{AttrValue, Attributes},
    options::{Font, FontSpec, ResolvedOptions},
};

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    fn as_str(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }
}

/// Escapes the characters HTML labels reserve.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Turns line breaks into `<br/>`.
fn html_newline(text: &str) -> String {
    text.replace('\n', "<br/>")
}

fn font_wrap(text: &str, font: Option<FontSpec<'_>>) -> String {
    let Some(font) = font else {
        return text.to_string();
    };
    let text = if font.italic {
        format!("<i>{text}</i>")
    } else {
        text.to_string()
    };
    match (font.face, font.size) {
        (None, None) => text,
        (None, Some(size)) => format!("<font point-size=\"{size}\">{text}</font>"),
        (Some(face), None) => format!("<font face=\"{face}\">{text}</font>"),
        (Some(face), Some(size)) => {
            format!("<font face=\"{face}\" point-size=\"{size}\">{text}</font>")
        }
    }
}

/// Drops package prefixes from every dotted name in `text`.
fn unqualify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut segment = String::new();
    for c in text.chars() {
        if c == '.' {
            segment.clear();
        } else if c.is_alphanumeric() || c == '_' || c == '$' {
            segment.push(c);
        } else {
            out.push_str(&segment);
            segment.clear();
            out.push(c);
        }
    }
    out.push_str(&segment);
    out
}

/// Renders a type reference the way member lines show it.
pub fn format_type(opts: &ResolvedOptions, type_ref: &TypeRef) -> String {
    let mut out = String::new();
    write_type(opts, type_ref, opts.show_qualified(), &mut out);
    out
}

fn write_type(opts: &ResolvedOptions, type_ref: &TypeRef, qualified: bool, out: &mut String) {
    match type_ref {
        TypeRef::Class { name, args } => {
            if qualified {
                out.push_str(name);
            } else {
                out.push_str(&unqualify(name));
            }
            if !args.is_empty() && !opts.hide_generics() {
                let qualified = opts.show_qualified() || opts.show_qualified_generics();
                out.push('<');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    write_type(opts, arg, qualified, out);
                }
                out.push('>');
            }
        }
        TypeRef::Array(element) => {
            write_type(opts, element, qualified, out);
            out.push_str("[]");
        }
        other if qualified => out.push_str(&other.to_string()),
        other => out.push_str(&unqualify(&other.to_string())),
    }
}

/// Name of a declared type as drawn in its node, type parameters included.
fn display_name(opts: &ResolvedOptions, decl: &TypeDecl) -> String {
    let mut name = decl.name().to_string();
    if !decl.type_params().is_empty() && !opts.hide_generics() {
        let params: Vec<String> = decl
            .type_params()
            .iter()
            .map(|param| {
                let bounds: Vec<String> = param
                    .bounds()
                    .iter()
                    .map(|bound| bound.to_string())
                    .collect();
                if bounds.is_empty() {
                    param.name().to_string()
                } else {
                    format!("{} extends {}", param.name(), bounds.join(" & "))
                }
            })
            .collect();
        name = format!("{name}<{}>", params.join(", "));
    }
    if opts.show_qualified() {
        name
    } else {
        unqualify(&name)
    }
}

fn visibility(opts: &ResolvedOptions, visibility: Visibility) -> String {
    if opts.show_visibility() {
        format!("{} ", visibility.symbol())
    } else {
        " ".to_string()
    }
}

fn type_annotation(opts: &ResolvedOptions, type_ref: &TypeRef) -> String {
    format!(" : {}", escape(&format_type(opts, type_ref)))
}

fn parameters(opts: &ResolvedOptions, method: &Method) -> String {
    method
        .params()
        .iter()
        .map(|param| format!("{}{}", param.name(), type_annotation(opts, param.type_ref())))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Accumulates the label HTML, indented unless the options ask for
/// compact output.
struct LabelWriter<'o> {
    opts: &'o ResolvedOptions,
    subject: &'o str,
    out: String,
    prefix: &'static str,
    postfix: &'static str,
}

impl<'o> LabelWriter<'o> {
    fn new(opts: &'o ResolvedOptions, subject: &'o str) -> Self {
        let (prefix, postfix) = if opts.compact() { ("", "") } else { ("\t", "\n") };
        Self {
            opts,
            subject,
            out: String::new(),
            prefix,
            postfix,
        }
    }

    fn external_table_start(&mut self, title: &str) {
        let bgcolor = self
            .opts
            .node_fill_color()
            .map(|color| format!(" bgcolor=\"{color}\""))
            .unwrap_or_default();
        self.out.push_str(&format!(
            "<table title=\"{title}\" border=\"0\" cellborder=\"{}\" cellspacing=\"0\" \
             cellpadding=\"2\" port=\"p\"{bgcolor}>{}",
            self.opts.shape().cell_border(),
            self.postfix
        ));
    }

    fn external_table_end(&mut self) {
        self.out.push_str(&format!("{0}{0}</table>", self.prefix));
    }

    fn inner_table_start(&mut self) {
        self.out.push_str(&format!(
            "{0}{0}<tr><td><table border=\"0\" cellspacing=\"0\" cellpadding=\"1\">{1}",
            self.prefix, self.postfix
        ));
    }

    fn inner_table_end(&mut self) {
        self.out
            .push_str(&format!("{0}{0}</table></td></tr>{1}", self.prefix, self.postfix));
    }

    fn first_inner_table_start(&mut self, rows: usize) {
        let extra = self.opts.shape().extra_column(rows).unwrap_or_default();
        self.out.push_str(&format!(
            "{0}{0}<tr>{extra}<td><table border=\"0\" cellspacing=\"0\" cellpadding=\"1\">{1}",
            self.prefix, self.postfix
        ));
    }

    fn first_inner_table_end(&mut self, rows: usize) {
        let extra = self.opts.shape().extra_column(rows).unwrap_or_default();
        self.out.push_str(&format!(
            "{0}{0}</table></td>{extra}</tr>{1}",
            self.prefix, self.postfix
        ));
    }

    fn line(&mut self, align: Align, text: &str, font: Font) {
        let align = align.as_str();
        let text = font_wrap(&format!(" {text} "), self.opts.font(font));
        self.out.push_str(&format!(
            "<tr><td align=\"{align}\" balign=\"{align}\">{text}</td></tr>{}",
            self.postfix
        ));
    }

    fn stereotypes(&mut self, tags: &[Tag], align: Align) {
        for tag in tags.iter().filter(|tag| tag.name() == "stereotype") {
            match parse_stereotype(tag.text()) {
                Ok(name) => {
                    let text = self.opts.guillemet_wrap(&name);
                    self.line(align, &text, Font::Normal);
                }
                Err(diag) => diag.log_skip(self.subject),
            }
        }
    }

    fn tag_values(&mut self, tags: &[Tag]) {
        for tag in tags.iter().filter(|tag| tag.name() == "tagvalue") {
            match parse_tag_value(tag.text()) {
                Ok(value) => {
                    let text = format!("{{{} = {}}}", value.name(), value.value());
                    self.line(Align::Right, &text, Font::Tag);
                }
                Err(diag) => diag.log_skip(self.subject),
            }
        }
    }

    fn name_rows(&mut self, qualified_name: &str, name_font: Font) {
        let split = qualified_name
            .find('<')
            .map_or(qualified_name, |start| &qualified_name[..start])
            .rfind('.');
        match split {
            Some(idx)
                if self.opts.postfix_package() && idx > 0 && idx < qualified_name.len() - 1 =>
            {
                let (package, name) = (&qualified_name[..idx], &qualified_name[idx + 1..]);
                self.line(Align::Center, &escape(name), name_font);
                self.line(Align::Center, package, Font::Package);
            }
            _ => self.line(Align::Center, &escape(qualified_name), name_font),
        }
    }

    fn attributes(&mut self, fields: &[&Field]) {
        for field in fields {
            self.stereotypes(field.tags(), Align::Left);
            let mut text = format!("{}{}", visibility(self.opts, field.visibility()), field.name());
            if self.opts.show_type() {
                text.push_str(&type_annotation(self.opts, field.type_ref()));
            }
            self.line(Align::Left, &text, Font::Normal);
            self.tag_values(field.tags());
        }
        if fields.is_empty() {
            self.line(Align::Left, "", Font::Normal);
        }
    }

    fn constructors(&mut self, constructors: &[&Method]) -> bool {
        for ctor in constructors {
            self.stereotypes(ctor.tags(), Align::Left);
            let params = if self.opts.show_type() {
                parameters(self.opts, ctor)
            } else {
                String::new()
            };
            let text = format!(
                "{}{}({params})",
                visibility(self.opts, ctor.visibility()),
                ctor.name()
            );
            self.line(Align::Left, &text, Font::Normal);
            self.tag_values(ctor.tags());
        }
        !constructors.is_empty()
    }

    fn operations(&mut self, methods: &[&Method]) -> bool {
        for method in methods {
            self.stereotypes(method.tags(), Align::Left);
            let mut text = format!("{}{}", visibility(self.opts, method.visibility()), method.name());
            if self.opts.show_type() {
                text.push_str(&format!("({})", parameters(self.opts, method)));
                if let Some(ret) = method.return_type() {
                    text.push_str(&type_annotation(self.opts, ret));
                }
            } else {
                text.push_str("()");
            }
            let font = if method.is_abstract() {
                Font::Abstract
            } else {
                Font::Normal
            };
            self.line(Align::Left, &text, font);
            self.tag_values(method.tags());
        }
        !methods.is_empty()
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Label of a declared type, with the member sections the options ask for.
///
/// Members tagged `@hidden`, or whose `<type>.<member>` name is hidden,
/// are left out.
pub fn type_label(decl: &TypeDecl, opts: &ResolvedOptions) -> String {
    let member_hidden = |name: &str| opts.hides(&format!("{}.{name}", decl.name()));
    let fields: Vec<&Field> = decl
        .fields()
        .iter()
        .filter(|field| !field.is_hidden() && !member_hidden(field.name()))
        .collect();
    let methods: Vec<&Method> = decl
        .methods()
        .iter()
        .filter(|method| !method.is_hidden() && !member_hidden(method.name()))
        .collect();
    let constructors: Vec<&Method> = decl
        .constructors()
        .iter()
        .filter(|ctor| !ctor.is_hidden())
        .collect();

    let is_enum = decl.is_enum();
    let shows_operations = !is_enum && (opts.show_constructors() || opts.show_operations());
    let show_members = (opts.show_attributes() && !decl.fields().is_empty())
        || (is_enum && opts.show_enum_constants() && !decl.enum_constants().is_empty())
        || (opts.show_operations() && !decl.methods().is_empty())
        || (opts.show_constructors() && !decl.constructors().is_empty());

    let mut rows = 1;
    if show_members {
        if opts.show_attributes() || shows_operations {
            rows += 1;
        }
        if is_enum && opts.show_enum_constants() {
            rows += 1;
        }
        if shows_operations {
            rows += 1;
        }
    }

    let mut w = LabelWriter::new(opts, decl.name());
    w.external_table_start(decl.name());
    w.first_inner_table_start(rows);
    if decl.is_interface() {
        w.line(Align::Center, &opts.guillemet_wrap("interface"), Font::Normal);
    }
    if is_enum {
        w.line(Align::Center, &opts.guillemet_wrap("enumeration"), Font::Normal);
    }
    w.stereotypes(decl.tags(), Align::Center);

    let name_font = if decl.is_abstract() && !decl.is_interface() {
        Font::ClassAbstract
    } else {
        Font::Class
    };
    if opts.show_comment() {
        let comment = html_newline(&escape(decl.comment().unwrap_or_default()));
        w.line(Align::Left, &comment, Font::Class);
    } else {
        w.name_rows(&display_name(opts, decl), name_font);
    }
    w.tag_values(decl.tags());
    w.first_inner_table_end(rows);

    if show_members {
        if opts.show_attributes() {
            w.inner_table_start();
            w.attributes(&fields);
            w.inner_table_end();
        } else if shows_operations {
            w.inner_table_start();
            w.line(Align::Left, "", Font::Normal);
            w.inner_table_end();
        }
        if is_enum && opts.show_enum_constants() {
            w.inner_table_start();
            for constant in decl.enum_constants() {
                w.line(Align::Left, constant, Font::Normal);
            }
            if decl.enum_constants().is_empty() {
                w.line(Align::Left, "", Font::Normal);
            }
            w.inner_table_end();
        }
        if shows_operations {
            w.inner_table_start();
            let mut printed = false;
            if opts.show_constructors() {
                printed |= w.constructors(&constructors);
            }
            if opts.show_operations() {
                printed |= w.operations(&methods);
            }
            if !printed {
                w.line(Align::Left, "", Font::Normal);
            }
            w.inner_table_end();
        }
    }
    w.external_table_end();
    w.finish()
}

/// Label of a type the model does not declare: its full name, with the
/// package on a second row when the options ask for it.
pub fn opaque_label(name: &str, opts: &ResolvedOptions) -> String {
    let mut w = LabelWriter::new(opts, name);
    w.external_table_start(name);
    w.inner_table_start();
    w.name_rows(name, Font::Class);
    w.inner_table_end();
    w.external_table_end();
    w.finish()
}

/// Label of a `@note` attached to the type `owner`.
pub fn note_label(owner: &str, text: &str, opts: &ResolvedOptions) -> String {
    let mut w = LabelWriter::new(opts, owner);
    w.external_table_start(owner);
    w.inner_table_start();
    w.line(Align::Left, &html_newline(&escape(text)), Font::Class);
    w.inner_table_end();
    w.external_table_end();
    w.finish()
}

/// Node attributes: the label, the node fonts and the shape.
pub fn node_attributes(label: String, opts: &ResolvedOptions) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert("label", AttrValue::Html(label));
    attributes.insert("fontname", AttrValue::quoted(opts.node_font_name()));
    attributes.insert("fontcolor", AttrValue::quoted(opts.node_font_color()));
    attributes.insert("fontsize", AttrValue::plain(opts.node_font_size()));
    for (name, value) in opts.shape().graphviz_attributes() {
        attributes.insert(name, AttrValue::plain(value));
    }
    attributes
}
