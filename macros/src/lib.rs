//! Набор универсальных макросов для приложений калькулятора смет.
//!
//! Сгенерированный код обращается к `QuoteError` без полного пути, поэтому
//! тип ошибки должен быть импортирован в модуль, где применяется derive.
use proc_macro::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{Data, DataStruct, DeriveInput, Fields, LitStr, Token, parse_macro_input};

/// Макрос `QuoteDisplay` автоматически генерирует для структуры реализацию
/// `Display` и `FromStr`, чтобы сериализовать/десериализовать её в строковый
/// формат с полями, разделёнными `|`. Он валидирует количество полей и
/// возвращает понятные ошибки парсинга.
///
/// `Display` не добавляет перевод строки, а `FromStr` отбрасывает завершающие
/// `\r`/`\n`: одна запись соответствует одной строке файла.
#[proc_macro_derive(QuoteDisplay)]
pub fn macros_quote_display(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let struct_name = &input.ident;

    // Сбор названия полей.
    let fields_name = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => &fields.named,
        _ => panic!("QuoteDisplay допустимо использовать только со структурами"),
    };

    let fields: Vec<_> = fields_name
        .iter()
        .filter_map(|field| field.ident.as_ref())
        .collect();

    let fields_count = fields.len();

    // Формат для Display: "{}|{}|{}"
    let fmt_string = vec!["{}"; fields_count].join("|");
    let fmt_lit = LitStr::new(&fmt_string, proc_macro2::Span::call_site());

    let fields_parses: Vec<_> = fields
        .iter()
        .enumerate()
        .map(|(i, field_name)| {
            quote! {
                #field_name: parts[#i]
                    .parse()
                    .map_err(|_| QuoteError::value_err(format!(
                        "ошибка парсинга строки {} на позиции {} для поля {}",
                        line, #i, stringify!(#field_name)
                    )))?,
            }
        })
        .collect();

    let output: proc_macro2::TokenStream = quote! {
        impl std::fmt::Display for #struct_name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(
                    f,
                    #fmt_lit,
                    #(self.#fields),*
                )
            }
        }

        impl std::str::FromStr for #struct_name {
            type Err = QuoteError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let line = s.trim_end_matches(['\r', '\n']);
                let parts: Vec<&str> = line.split('|').collect();
                if parts.len() != #fields_count {
                    Err(QuoteError::value_err(format!(
                        "ожидается {} полей, разделённых '|', получено {} в строке {}",
                        #fields_count,
                        parts.len(),
                        line
                    )))
                } else {
                    Ok(Self {
                        #(#fields_parses)*
                    })
                }
            }
        }
    };

    TokenStream::from(output)
}

/// Derive-макрос для `Enum`: автоматически добавляет реализации
/// [`std::fmt::Display`] и [`std::str::FromStr`].
///
/// Атрибут `#[str(...)]` принимает одно или несколько строковых значений.
/// Первое используется для `Display`, остальные дополнительно принимаются
/// при разборе (синонимы). Без атрибута используется имя варианта в нижнем
/// регистре. Разбор нечувствителен к регистру и пробелам по краям.
///
/// ## Пример
///
/// ```ignore
/// use macros::QuoteEnumDisplay;
///
/// #[derive(Debug, Clone, QuoteEnumDisplay)]
/// enum FinishLevel {
///     #[str("basic", "basico")]
///     Basic,
///     #[str("premium")]
///     Premium,
/// }
///
/// assert_eq!(FinishLevel::Basic.to_string(), "basic");
/// assert!(matches!("BASICO".parse::<FinishLevel>(), Ok(FinishLevel::Basic)));
/// ```
#[proc_macro_derive(QuoteEnumDisplay, attributes(str))]
pub fn derive_display_fromstr(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let variants = match input.data {
        Data::Enum(e) => e.variants,
        _ => panic!("QuoteEnumDisplay допустимо использовать только с enum"),
    };

    let mut to_arms = Vec::new();
    let mut from_arms = Vec::new();

    for v in variants {
        let ident = v.ident;
        if !matches!(v.fields, Fields::Unit) {
            panic!("Только unit-variants");
        }

        let mut names = vec![ident.to_string().to_lowercase()];
        for attr in v.attrs {
            if attr.path().is_ident("str") {
                let lits = attr
                    .parse_args_with(Punctuated::<LitStr, Token![,]>::parse_terminated)
                    .expect("str(\"...\", ...)");
                let values: Vec<String> = lits.iter().map(|lit| lit.value()).collect();
                if values.is_empty() {
                    panic!("атрибут str требует хотя бы одно значение");
                }
                names = values;
            }
        }

        let display = LitStr::new(&names[0], proc_macro2::Span::call_site());
        to_arms.push(quote! { #name::#ident => write!(f, #display), });

        let accepted: Vec<LitStr> = names
            .iter()
            .map(|n| LitStr::new(&n.to_lowercase(), proc_macro2::Span::call_site()))
            .collect();
        from_arms.push(quote! { #(#accepted)|* => Ok(#name::#ident), });
    }

    let expanded = quote! {
        impl std::fmt::Display for #name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                match self { #(#to_arms)* }
            }
        }

        impl std::str::FromStr for #name {
            type Err = QuoteError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    #(#from_arms)*
                    _ => Err(QuoteError::value_err(format!(
                        "некорректное значение {}: {}",
                        stringify!(#name), s
                    ))),
                }
            }
        }
    };

    TokenStream::from(expanded)
}
