use super::super::Model;
use yew::prelude::*;

fn step_class(active: bool) -> &'static str {
    if active { "step active" } else { "step" }
}

pub fn render_header(model: &Model) -> Html {
    let has_result = model.result.is_some();
    let status = if model.loading {
        "Analyzing MRI scan..."
    } else if has_result {
        "Analysis complete"
    } else {
        "Enter patient details and upload an MRI image"
    };

    html! {
        <header class="app-header">
            <h1>{ "Brain Tumor Detection" }</h1>
            <ol class="steps">
                <li class={step_class(!has_result)}>{ "Patient details" }</li>
                <li class={step_class(has_result)}>{ "Result" }</li>
            </ol>
            <p class="subtitle">{ status }</p>
        </header>
    }
}
