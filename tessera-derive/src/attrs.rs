use syn::meta::ParseNestedMeta;
use syn::{Attribute, Expr, Lit, LitBool, LitInt, LitStr, Path, Token};

/// `#[mapping(...)]` and `#[serde(...)]` on the struct.
#[derive(Default)]
pub(crate) struct ContainerAttrs {
    pub type_name: Option<String>,
    pub index: Option<String>,
    pub dynamic: Option<&'static str>,
    pub date_detection: Option<bool>,
    pub numeric_detection: Option<bool>,
    pub index_analyzer: Option<String>,
    pub search_analyzer: Option<String>,
    pub krate: Option<Path>,
    pub rename_all: Option<RenameRule>,
}

/// `#[mapping(...)]` and `#[serde(...)]` on a field.
#[derive(Default)]
pub(crate) struct FieldAttrs {
    pub rename: Option<String>,
    pub opt_out: bool,
    pub name: Option<String>,
    pub kind: Option<&'static str>,
    pub index: Option<&'static str>,
    pub store: Option<bool>,
    pub format: Option<String>,
    pub analyzer: Option<String>,
    pub index_analyzer: Option<String>,
    pub search_analyzer: Option<String>,
    pub ignore_above: Option<u32>,
    pub null_value: Option<Lit>,
    pub boost: Option<f64>,
    pub include_in_all: Option<bool>,
}

impl ContainerAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();

        for attr in attrs {
            if attr.path().is_ident("mapping") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("type_name") {
                        out.type_name = Some(string(&meta)?);
                    } else if meta.path.is_ident("index") {
                        out.index = Some(string(&meta)?);
                    } else if meta.path.is_ident("dynamic") {
                        out.dynamic = Some(dynamic(&meta)?);
                    } else if meta.path.is_ident("date_detection") {
                        out.date_detection = Some(flag(&meta)?);
                    } else if meta.path.is_ident("numeric_detection") {
                        out.numeric_detection = Some(flag(&meta)?);
                    } else if meta.path.is_ident("index_analyzer") {
                        out.index_analyzer = Some(string(&meta)?);
                    } else if meta.path.is_ident("search_analyzer") {
                        out.search_analyzer = Some(string(&meta)?);
                    } else if meta.path.is_ident("crate") {
                        out.krate = Some(meta.value()?.parse::<LitStr>()?.parse()?);
                    } else {
                        return Err(meta.error("unknown mapping attribute"));
                    }
                    Ok(())
                })?;
            } else if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename_all") {
                        if let Some(rule) = serialize_name(&meta)? {
                            out.rename_all = Some(RenameRule::parse(&rule, &meta)?);
                        }
                        Ok(())
                    } else {
                        skip(&meta)
                    }
                })?;
            }
        }

        Ok(out)
    }
}

impl FieldAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut out = Self::default();

        for attr in attrs {
            if attr.path().is_ident("mapping") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        out.name = Some(string(&meta)?);
                    } else if meta.path.is_ident("kind") {
                        out.kind = Some(field_kind(&meta)?);
                    } else if meta.path.is_ident("index") {
                        out.index = Some(index_option(&meta)?);
                    } else if meta.path.is_ident("store") {
                        out.store = Some(flag(&meta)?);
                    } else if meta.path.is_ident("format") {
                        out.format = Some(string(&meta)?);
                    } else if meta.path.is_ident("analyzer") {
                        out.analyzer = Some(string(&meta)?);
                    } else if meta.path.is_ident("index_analyzer") {
                        out.index_analyzer = Some(string(&meta)?);
                    } else if meta.path.is_ident("search_analyzer") {
                        out.search_analyzer = Some(string(&meta)?);
                    } else if meta.path.is_ident("ignore_above") {
                        out.ignore_above = Some(meta.value()?.parse::<LitInt>()?.base10_parse()?);
                    } else if meta.path.is_ident("null_value") {
                        out.null_value = Some(meta.value()?.parse()?);
                    } else if meta.path.is_ident("boost") {
                        out.boost = Some(number(&meta)?);
                    } else if meta.path.is_ident("include_in_all") {
                        out.include_in_all = Some(flag(&meta)?);
                    } else if meta.path.is_ident("opt_out") {
                        out.opt_out = flag(&meta)?;
                    } else {
                        return Err(meta.error("unknown mapping attribute"));
                    }
                    Ok(())
                })?;
            } else if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") {
                        if let Some(name) = serialize_name(&meta)? {
                            out.rename = Some(name);
                        }
                        Ok(())
                    } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                        out.opt_out = true;
                        Ok(())
                    } else {
                        skip(&meta)
                    }
                })?;
            }
        }

        Ok(out)
    }

    /// Whether any mapping override was given.
    pub fn has_overrides(&self) -> bool {
        self.opt_out
            || self.name.is_some()
            || self.kind.is_some()
            || self.index.is_some()
            || self.store.is_some()
            || self.format.is_some()
            || self.analyzer.is_some()
            || self.index_analyzer.is_some()
            || self.search_analyzer.is_some()
            || self.ignore_above.is_some()
            || self.null_value.is_some()
            || self.boost.is_some()
            || self.include_in_all.is_some()
    }
}

fn string(meta: &ParseNestedMeta) -> syn::Result<String> {
    Ok(meta.value()?.parse::<LitStr>()?.value())
}

/// `flag` alone means true; `flag = false` is also accepted.
fn flag(meta: &ParseNestedMeta) -> syn::Result<bool> {
    if meta.input.peek(Token![=]) {
        Ok(meta.value()?.parse::<LitBool>()?.value)
    } else {
        Ok(true)
    }
}

fn number(meta: &ParseNestedMeta) -> syn::Result<f64> {
    match meta.value()?.parse::<Lit>()? {
        Lit::Float(lit) => lit.base10_parse(),
        Lit::Int(lit) => lit.base10_parse(),
        other => Err(syn::Error::new(other.span(), "expected a number")),
    }
}

fn field_kind(meta: &ParseNestedMeta) -> syn::Result<&'static str> {
    let lit = meta.value()?.parse::<LitStr>()?;
    let variant = match lit.value().as_str() {
        "text" | "string" => "Text",
        "keyword" => "Keyword",
        "date" => "Date",
        "long" => "Long",
        "double" => "Double",
        "boolean" => "Boolean",
        "binary" => "Binary",
        "object" => "Object",
        "nested" => "Nested",
        "array" => "Array",
        other => {
            return Err(syn::Error::new(
                lit.span(),
                format!("unknown field kind `{}`", other),
            ));
        }
    };
    Ok(variant)
}

fn index_option(meta: &ParseNestedMeta) -> syn::Result<&'static str> {
    let lit = meta.value()?.parse::<LitStr>()?;
    match lit.value().as_str() {
        "analyzed" => Ok("Analyzed"),
        "not_analyzed" => Ok("NotAnalyzed"),
        "no" => Ok("No"),
        _ => Err(syn::Error::new(
            lit.span(),
            "expected `analyzed`, `not_analyzed` or `no`",
        )),
    }
}

fn dynamic(meta: &ParseNestedMeta) -> syn::Result<&'static str> {
    match meta.value()?.parse::<Lit>()? {
        Lit::Bool(lit) if lit.value => Ok("Enabled"),
        Lit::Bool(_) => Ok("Disabled"),
        Lit::Str(lit) => match lit.value().as_str() {
            "true" => Ok("Enabled"),
            "false" => Ok("Disabled"),
            "strict" => Ok("Strict"),
            _ => Err(syn::Error::new(lit.span(), "expected `true`, `false` or `strict`")),
        },
        other => Err(syn::Error::new(other.span(), "expected a bool or \"strict\"")),
    }
}

/// Serialized name from `key = "..."` or `key(serialize = "...")`.
fn serialize_name(meta: &ParseNestedMeta) -> syn::Result<Option<String>> {
    if meta.input.peek(Token![=]) {
        return string(meta).map(Some);
    }

    let mut name = None;
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("serialize") {
            name = Some(string(&inner)?);
            Ok(())
        } else {
            skip(&inner)
        }
    })?;
    Ok(name)
}

/// Consume a serde argument this macro does not care about.
fn skip(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        content.parse::<proc_macro2::TokenStream>()?;
    }
    Ok(())
}

/// serde's `rename_all` rules, applied to snake_case field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn parse(rule: &str, meta: &ParseNestedMeta) -> syn::Result<Self> {
        match rule {
            "lowercase" => Ok(Self::Lower),
            "UPPERCASE" => Ok(Self::Upper),
            "PascalCase" => Ok(Self::Pascal),
            "camelCase" => Ok(Self::Camel),
            "snake_case" => Ok(Self::Snake),
            "SCREAMING_SNAKE_CASE" => Ok(Self::ScreamingSnake),
            "kebab-case" => Ok(Self::Kebab),
            "SCREAMING-KEBAB-CASE" => Ok(Self::ScreamingKebab),
            other => Err(meta.error(format!("unknown rename rule `{}`", other))),
        }
    }

    pub fn apply(self, field: &str) -> String {
        match self {
            Self::Lower | Self::Snake => field.to_string(),
            Self::Upper | Self::ScreamingSnake => field.to_ascii_uppercase(),
            Self::Pascal => pascal(field),
            Self::Camel => {
                let pascal = pascal(field);
                let mut chars = pascal.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
                    None => pascal,
                }
            }
            Self::Kebab => field.replace('_', "-"),
            Self::ScreamingKebab => field.to_ascii_uppercase().replace('_', "-"),
        }
    }
}

fn pascal(field: &str) -> String {
    field
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
