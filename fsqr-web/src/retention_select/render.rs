use fsqr_widgets::{OptionSnapshot, SelectConfig, menu_id, option_id};
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, HtmlButtonElement, HtmlElement, HtmlOptionElement, HtmlSelectElement, Node,
};

use crate::error::WidgetError;

/// 36^6, the number of distinct menu id suffixes.
const SUFFIX_SPACE: f64 = 2_176_782_336.0;

/// The custom controls built next to a native select.
pub(super) struct RenderedSelect {
    pub wrapper: Element,
    pub native: HtmlSelectElement,
    pub trigger: HtmlButtonElement,
    pub menu: HtmlElement,
    pub items: Vec<HtmlElement>,
}

/// Static snapshot of the native options.
pub(super) fn snapshot_options(native: &HtmlSelectElement) -> Vec<OptionSnapshot> {
    let options = native.options();
    (0..options.length())
        .filter_map(|idx| options.item(idx))
        .filter_map(|el| el.dyn_into::<HtmlOptionElement>().ok())
        .map(|opt| OptionSnapshot {
            label: opt.text_content().unwrap_or_default(),
            value: opt.value(),
            disabled: opt.disabled(),
            selected: opt.selected(),
        })
        .collect()
}

/// Hide the native control and insert the trigger and listbox into `wrapper`.
pub(super) fn render(
    doc: &Document,
    wrapper: &Element,
    native: HtmlSelectElement,
    options: &[OptionSnapshot],
    cfg: &SelectConfig,
) -> Result<RenderedSelect, WidgetError> {
    wrapper.set_attribute(&cfg.enhanced_attr, "true")?;
    wrapper.class_list().add_1(&cfg.enhanced_class)?;

    native.set_attribute("aria-hidden", "true")?;
    native.set_tab_index(-1);

    let arrow = wrapper.query_selector(&cfg.arrow_selector())?;
    if let Some(arrow) = &arrow {
        arrow.set_attribute("aria-hidden", "true")?;
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let entropy = (js_sys::Math::random() * SUFFIX_SPACE) as u64;
    let native_id = native.id();
    let menu_id = menu_id(Some(native_id.as_str()), &cfg.fallback_id, entropy);

    let trigger: HtmlButtonElement = create(doc, "button", "HTMLButtonElement")?;
    trigger.set_type("button");
    trigger.set_class_name(&cfg.trigger_class);
    trigger.set_attribute("aria-haspopup", "listbox")?;
    trigger.set_attribute("aria-controls", &menu_id)?;
    trigger.set_attribute("aria-expanded", "false")?;

    let menu: HtmlElement = create(doc, "ul", "HTMLElement")?;
    menu.set_class_name(&cfg.menu_class);
    menu.set_id(&menu_id);
    menu.set_attribute("role", "listbox")?;
    menu.set_tab_index(-1);

    let mut items = Vec::with_capacity(options.len());
    for (index, option) in options.iter().enumerate() {
        let item: HtmlElement = create(doc, "li", "HTMLElement")?;
        item.set_class_name(&cfg.option_class);
        item.set_attribute("data-value", &option.value)?;
        item.set_attribute("role", "option")?;
        item.set_tab_index(-1);
        item.set_id(&option_id(&menu_id, index));
        item.set_text_content(Some(&option.label));
        if option.disabled {
            item.set_attribute("aria-disabled", "true")?;
        }
        menu.append_child(&item)?;
        items.push(item);
    }

    // The trigger sits in front of the decorative arrow when the arrow is a direct child.
    let wrapper_node: Node = wrapper.clone().into();
    let reference: Option<Node> = arrow
        .filter(|arrow| arrow.parent_node().as_ref() == Some(&wrapper_node))
        .map(Node::from);
    wrapper.insert_before(&trigger, reference.as_ref())?;
    wrapper.append_child(&menu)?;

    Ok(RenderedSelect {
        wrapper: wrapper.clone(),
        native,
        trigger,
        menu,
        items,
    })
}

fn create<T: JsCast>(doc: &Document, tag: &str, kind: &'static str) -> Result<T, WidgetError> {
    doc.create_element(tag)?
        .dyn_into::<T>()
        .map_err(|_| WidgetError::WrongElement(kind))
}
