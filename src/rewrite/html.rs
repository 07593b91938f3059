//! Streaming rewrite of page markup

use crate::html::{is_injected, reference_attributes, replace_css_urls, rewrite_srcset};
use crate::rewrite::resolver::LinkResolver;
use lol_html::errors::RewritingError;
use lol_html::html_content::ContentType;
use lol_html::{doc_comments, element, text, HtmlRewriter, Settings};

/// Rewrites every reference in a page and drops injected archive markup
///
/// # Rewritten
///
/// - each attribute of the (tag, attribute) reference table
/// - the URL token of each `srcset` candidate
/// - `url(...)` inside `style` attributes and `<style>` blocks
///
/// Elements matching the injected-element criteria and all comments are
/// removed. References the resolver declines are left untouched.
pub fn rewrite_html(html: &str, resolver: &LinkResolver<'_>) -> Result<String, RewritingError> {
    let mut output = Vec::with_capacity(html.len());
    let mut style_text = String::new();

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("*", |el| {
                    if is_injected(el) {
                        el.remove();
                        return Ok(());
                    }

                    let tag = el.tag_name();
                    for attr in reference_attributes(&tag) {
                        if let Some(value) = el.get_attribute(attr) {
                            if let Some(new_value) = resolver.resolve(&value) {
                                el.set_attribute(attr, &new_value)?;
                            }
                        }
                    }

                    if let Some(srcset) = el.get_attribute("srcset") {
                        let new_srcset = rewrite_srcset(&srcset, |url| resolver.resolve(url));
                        el.set_attribute("srcset", &new_srcset)?;
                    }

                    if let Some(style) = el.get_attribute("style") {
                        let new_style = replace_css_urls(&style, |url| resolver.resolve(url));
                        if new_style != style {
                            el.set_attribute("style", &new_style)?;
                        }
                    }

                    Ok(())
                }),
                // Style text may arrive in several chunks; rewrite it whole
                text!("style", |chunk| {
                    style_text.push_str(chunk.as_str());
                    if chunk.last_in_text_node() {
                        let css = std::mem::take(&mut style_text);
                        let rewritten = replace_css_urls(&css, |url| resolver.resolve(url));
                        chunk.replace(&rewritten, ContentType::Html);
                    } else {
                        chunk.remove();
                    }
                    Ok(())
                }),
            ],
            document_content_handlers: vec![doc_comments!(|c| {
                c.remove();
                Ok(())
            })],
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    rewriter.write(html.as_bytes())?;
    rewriter.end()?;

    Ok(String::from_utf8_lossy(&output).into_owned())
}
