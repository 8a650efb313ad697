use maud::{Escaper, Markup, PreEscaped, Render, html};
use std::fmt::Write;

pub const INPUT_CLASSES: &str = "shadow appearance-none border rounded w-full py-2 px-3 leading-tight focus:outline-none focus:shadow-outline bg-gray-700 border-gray-600";
pub const LABEL_CLASSES: &str = "block text-sm font-bold mb-2 text-gray-300";

pub fn render_table<const N: usize>(
    overall_title: &'static str,
    titles: [&'static str; N],
    items: Vec<[Markup; N]>,
) -> Markup {
    html! {
        div class="container mx-auto" {
            (title(overall_title))
            (table(titles, items))
        }
    }
}

pub fn table<const N: usize>(titles: [&'static str; N], items: Vec<[Markup; N]>) -> Markup {
    html! {
        div class="overflow-x-auto" {
            table class="min-w-full bg-gray-800 rounded shadow-md" {
                thead class="bg-gray-700" {
                    tr {
                        @for title in titles {
                            th class="py-2 px-4 text-left font-semibold text-gray-300" {(title)}
                        }
                    }
                }
                tbody {
                    @for row in items {
                        tr {
                            @for col in row {
                                td class="py-2 px-4 border-b border-gray-600 text-gray-200" {(col)}
                            }
                        }
                    }
                }
            }
        }
    }
}

pub fn escape(s: impl AsRef<str>) -> PreEscaped<String> {
    let mut output = String::new();
    let _ = Escaper::new(&mut output).write_str(s.as_ref()); //writing to a String never fails
    PreEscaped(output)
}

pub fn title(s: impl Render) -> Markup {
    html! {
        h1 class="text-2xl font-semibold mb-4" {(s)}
    }
}

pub fn subtitle(s: impl Render) -> Markup {
    html! {
        h2 class="text-xl font-semibold mb-2" {(s)}
    }
}

pub fn alert(heading: impl Render, message: impl Render) -> Markup {
    html! {
        div role="alert" class="bg-red-100 border border-red-400 text-red-700 px-4 py-4 rounded relative mb-4" {
            strong class="font-bold" {(heading)}
            br;
            span class="block sm:inline" {(message)}
        }
    }
}

pub fn notice(message: impl Render) -> Markup {
    html! {
        div role="status" class="bg-green-100 border border-green-400 text-green-800 px-4 py-4 rounded relative mb-4" {
            span class="block sm:inline" {(message)}
        }
    }
}

pub fn errors_list<T: Render>(heading: Option<&str>, errors: impl IntoIterator<Item = T>) -> Markup {
    html! {
        div role="alert" class="bg-red-100 border border-red-400 text-red-700 px-4 py-4 rounded relative mb-4" {
            @if let Some(heading) = heading {
                strong class="font-bold" {(heading)}
            }
            ul class="list-disc list-inside" {
                @for error in errors {
                    li {(error)}
                }
            }
        }
    }
}

/// A labelled `<input>`. `value` pre-fills it.
pub fn form_element(
    id: &str,
    label: &str,
    required: bool,
    input_type: Option<&str>,
    value: Option<&str>,
) -> Markup {
    html! {
        div class="mb-4" {
            label for=(id) class=(LABEL_CLASSES) {(label)}
            input required[required] type=(input_type.unwrap_or("text")) id=(id) name=(id) value=[value] class=(INPUT_CLASSES) {}
        }
    }
}

pub fn select_element<'a>(
    id: &str,
    label: &str,
    required: bool,
    options: impl IntoIterator<Item = &'a str>,
    selected: &str,
) -> Markup {
    html! {
        div class="mb-4" {
            label for=(id) class=(LABEL_CLASSES) {(label)}
            select required[required] id=(id) name=(id) class=(INPUT_CLASSES) {
                option value="" selected[selected.is_empty()] {"Select..."}
                @for choice in options {
                    option value=(choice) selected[choice == selected] {(choice)}
                }
            }
        }
    }
}

pub fn form_submit_button(text: Option<&str>) -> Markup {
    html! {
        div class="flex items-center justify-between" {
            button type="submit" class="bg-blue-500 hover:bg-blue-700 font-bold py-2 px-4 rounded focus:outline-none focus:shadow-outline" {
                (text.unwrap_or("Submit"))
            }
        }
    }
}

/// Tab strip for pages with several views. The tab at `active` is highlighted.
pub fn tabs(items: &[(&str, &str)], active: usize) -> Markup {
    html! {
        div class="flex flex-row space-x-2 mb-6 border-b border-gray-600" {
            @for (i, (href, label)) in items.iter().enumerate() {
                @if i == active {
                    a href=(href) class="py-2 px-4 border-b-2 border-blue-500 font-bold" {(label)}
                } @else {
                    a href=(href) class="py-2 px-4 text-gray-400 hover:text-white" {(label)}
                }
            }
        }
    }
}
