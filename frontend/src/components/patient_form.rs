use super::super::{Model, Msg};
use super::utils::{input_value, select_value, selected_file};
use shared::{Gender, IntoEnumIterator};
use yew::prelude::*;

pub fn render_patient_form(model: &Model, ctx: &Context<Model>) -> Html {
    let link = ctx.link();
    let on_submit = link.callback(|e: SubmitEvent| {
        e.prevent_default();
        Msg::Submit
    });

    html! {
        <form class="patient-form" onsubmit={on_submit}>
            <div class="form-grid">
                <label for="name">{"Full Name"}</label>
                <input id="name" type="text" value={model.name.clone()}
                    oninput={link.callback(|e: InputEvent| Msg::SetName(input_value(&e)))} />

                <label for="age">{"Age"}</label>
                <input id="age" type="text" value={model.age.clone()}
                    oninput={link.callback(|e: InputEvent| Msg::SetAge(input_value(&e)))} />

                <label for="gender">{"Gender"}</label>
                <select id="gender" onchange={link.callback(|e: Event| Msg::SetGender(select_value(&e)))}>
                    <option value="" selected={model.gender.is_empty()}>{"Select..."}</option>
                    { for Gender::iter().map(|gender| {
                        let label = gender.to_string();
                        html! {
                            <option value={label.clone()} selected={model.gender == label}>{ label.clone() }</option>
                        }
                    })}
                </select>

                <label for="patient-id">{"Patient ID / Mobile"}</label>
                <input id="patient-id" type="text" value={model.id.clone()}
                    oninput={link.callback(|e: InputEvent| Msg::SetId(input_value(&e)))} />
            </div>

            <div class="upload-area">
                <label for="file-input">{"MRI Image"}</label>
                <input id="file-input" type="file" accept=".jpg,.jpeg,.png"
                    onchange={link.callback(|e: Event| Msg::SetFile(selected_file(&e)))} />
                {
                    match &model.file {
                        Some(file) => html! { <p class="file-name">{ file.name() }</p> },
                        None => html! {},
                    }
                }
            </div>

            <button type="submit" class="analyze-btn" disabled={model.loading}>
                { if model.loading { "Analyzing..." } else { "Analyze MRI" } }
            </button>
        </form>
    }
}
