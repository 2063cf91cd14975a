use super::super::Model;
use web_sys::{File, HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

pub fn input_value(e: &InputEvent) -> String {
    let input: HtmlInputElement = e.target_unchecked_into();
    input.value()
}

pub fn select_value(e: &Event) -> String {
    let select: HtmlSelectElement = e.target_unchecked_into();
    select.value()
}

pub fn selected_file(e: &Event) -> Option<File> {
    let input: HtmlInputElement = e.target_unchecked_into();
    input.files().and_then(|files| files.item(0))
}

pub fn render_error_message(model: &Model) -> Html {
    if let Some(error_msg) = &model.error {
        html! {
            <div class="error-message">
                <p>{ error_msg.clone() }</p>
            </div>
        }
    } else {
        html! {}
    }
}
