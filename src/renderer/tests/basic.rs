use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::config::EngineConfig;
use crate::context::Context;
use crate::engine::Engine;
use crate::loader::MemoryLoader;

use super::render_template;

#[tokio::test]
async fn render_simple_string() {
    let result = render_template("<h1>Hello world</h1>", &Context::new()).await;
    assert_eq!(result.unwrap(), "<h1>Hello world</h1>".to_owned());
}

#[tokio::test]
async fn render_variable_block_lit_expr() {
    let inputs = vec![
        ("{{ 1 }}", "1"),
        ("{{ 3.14 }}", "3.14"),
        ("{{ \"hey\" }}", "hey"),
        ("{{ 'single' }}", "single"),
        ("{{ true }}", "true"),
        ("{{ null }}", ""),
        ("{{ 1 + 1 }}", "2"),
        ("{{ 1 + 1.5 }}", "2.5"),
        ("{{ 10 / 4 }}", "2.5"),
        ("{{ 10 / 5 }}", "2"),
        ("{{ 2 + 3 * 4 }}", "14"),
        ("{{ (2 + 3) * 4 }}", "20"),
        ("{{ 2 ** 3 }}", "8"),
        ("{{ 7 % 3 }}", "1"),
        ("{{ -2 + 1 }}", "-1"),
        ("{{ 0 / 0 }}", "NaN"),
        ("{{ \"a\" + \"b\" }}", "ab"),
        ("{{ \"a\" & 1 }}", "a1"),
        ("{{ 1 & 2 }}", "12"),
        ("{{ 1 == \"1\" }}", "true"),
        ("{{ 1 === \"1\" }}", "false"),
        ("{{ 1 !== 1.0 }}", "false"),
        ("{{ !0 }}", "true"),
        ("{{ 1 && 2 }}", "2"),
        ("{{ 0 || \"fallback\" }}", "fallback"),
        ("{{ true ? \"y\" : \"n\" }}", "y"),
        ("{{ [1, 2, 3] }}", "[1, 2, 3]"),
        ("{{ [1, 2][1] }}", "2"),
        ("{{ {a: 1, \"b c\": 2}[\"b c\"] }}", "2"),
        ("{{ \"abc\".length }}", "3"),
    ];

    for (input, expected) in inputs {
        println!("{:?} -> {:?}", input, expected);
        assert_eq!(render_template(input, &Context::new()).await.unwrap(), expected);
    }
}

#[tokio::test]
async fn nan_and_infinity_stay_numbers_until_rendered() {
    let inputs = vec![
        ("{{ 1 / 0 }}", "Infinity"),
        ("{{ -1 / 0 }}", "-Infinity"),
        ("{{ (0 / 0) + 1 }}", "NaN"),
        ("{{ 1 / 0 + 1 }}", "Infinity"),
        ("{{ 1 / (1 / 0) }}", "0"),
        ("{{ 0 / 0 == 0 / 0 }}", "false"),
        ("{{ 0 / 0 === 0 / 0 }}", "false"),
        ("{{ 0 / 0 != 0 / 0 }}", "true"),
        ("{{ 1 / 0 == 2 / 0 }}", "true"),
        ("{{ 0 / 0 || \"none\" }}", "none"),
        ("{{ (1 / 0) & \"!\" }}", "Infinity!"),
        ("{{#if 0 / 0}}truthy{{#else}}falsy{{/if}}", "falsy"),
        ("{{#if 1 / 0}}truthy{{#else}}falsy{{/if}}", "truthy"),
        ("{{#if 1 / 0 > 5}}big{{#else}}not big{{/if}}", "big"),
        ("{{#if -1 / 0 < -5}}small{{#else}}not small{{/if}}", "small"),
        ("{{#if 0 / 0 >= 0}}yes{{#else}}no{{/if}}", "no"),
        ("{{#set n = 1 / 0}}{{ n }}", "Infinity"),
    ];

    for (input, expected) in inputs {
        println!("{:?} -> {:?}", input, expected);
        assert_eq!(render_template(input, &Context::new()).await.unwrap(), expected);
    }
}

#[tokio::test]
async fn render_variables() {
    let mut context = Context::new();
    context.insert("name", &"Bob");
    context.insert("user", &json!({"name": "Ann", "tags": ["a", "b"]}));

    let inputs = vec![
        ("{{ name }}", "Bob"),
        ("{{ user.name }}", "Ann"),
        ("{{ user.tags.1 }}", "b"),
        ("{{ user[\"name\"] }}", "Ann"),
        ("{{ user.tags.length }}", "2"),
        ("{{ user.tags[user.tags.length - 1] }}", "b"),
        ("{{ missing }}", ""),
        ("{{ missing.deep.down }}", ""),
        ("{{ this.name }}", "Bob"),
        ("{{ @index }}", ""),
    ];

    for (input, expected) in inputs {
        println!("{:?} -> {:?}", input, expected);
        assert_eq!(render_template(input, &context).await.unwrap(), expected);
    }
}

#[tokio::test]
async fn interpolations_are_escaped() {
    let mut context = Context::new();
    context.insert("html", &"<b>hi</b>");

    let result = render_template("{{ html }}", &context).await.unwrap();
    assert_eq!(result, "&lt;b&gt;hi&lt;&#x2F;b&gt;");

    let result = render_template("{{ \"<b>\" | uppercase }}", &context).await.unwrap();
    assert_eq!(result, "&lt;B&gt;");
}

#[tokio::test]
async fn autoescape_can_be_disabled() {
    let mut context = Context::new();
    context.insert("html", &"<b>hi</b>");
    let engine =
        Engine::with_loader(EngineConfig::default().with_autoescape(false), MemoryLoader::new());

    assert_eq!(engine.render_str("{{ html }}", &context).await.unwrap(), "<b>hi</b>");
}

#[tokio::test]
async fn html_variables_are_not_escaped() {
    let mut context = Context::new();
    context.insert("html_snippet", &"<b>hi</b>");
    context.insert("name", &"Bob");

    let inputs = vec![
        ("{{ html_snippet }}", "<b>hi</b>"),
        ("{{#set html_link = \"<a>\" & name & \"</a>\"}}{{ html_link }}", "<a>Bob</a>"),
        // the marker survives escaping and concatenation
        ("{{#set html_b = \"<b>\"}}{{ \"[\" & html_b & \"]\" }}", "[<b>]"),
        ("{{#set html_i = \"<i>\"}}{{#set html_both = html_i & \"!\"}}{{ html_both }}", "<i>!"),
        // filters work on the html itself and their output is escaped
        ("{{#set html_c = \"<p>card body</p>\"}}{{ html_c | truncate(12) }}", "&lt;p&gt;card body..."),
        ("{{#set html_c = \"<p>card</p>\"}}{{ html_c | stripTags }}", "card"),
        ("{{#set html_c = \"<p>a</p>\"}}{{ html_c | length }}", "8"),
        ("{{#set html_c = \"<p>card body</p>\"}}{{#set html_s = html_c | truncate(12)}}{{ html_s }}", "<p>card body..."),
    ];

    for (input, expected) in inputs {
        println!("{:?} -> {:?}", input, expected);
        assert_eq!(render_template(input, &context).await.unwrap(), expected);
    }
}

#[tokio::test]
async fn set_variables() {
    let mut context = Context::new();
    context.insert("user", &json!({"name": "Ann"}));
    context.insert("list", &json!(["a", "b"]));
    context.insert("nums", &json!([1, 2, 3]));

    let inputs = vec![
        ("{{#set count = 1}}{{#set count = count + 1}}{{ count }}", "2"),
        ("{{#set user.name = \"Zed\"}}{{ user.name }}", "Zed"),
        ("{{#set user.address.city = \"Paris\"}}{{ user.address.city }}", "Paris"),
        ("{{#set user[\"age\"] = 30}}{{ user.age }}", "30"),
        ("{{#set list[0] = \"x\"}}{{ list | join(\",\") }}", "x,b"),
        ("{{#set list[2] = \"c\"}}{{ list.length }}", "3"),
        ("{{#set total = 0}}{{#each nums}}{{#set total = total + this}}{{/each}}{{ total }}", "6"),
    ];

    for (input, expected) in inputs {
        println!("{:?} -> {:?}", input, expected);
        assert_eq!(render_template(input, &context).await.unwrap(), expected);
    }
}

#[tokio::test]
async fn render_if_elseif_else() {
    let tests: Vec<(&str, Value, &str)> = vec![
        ("{{#if score > 50}}Pass{{#else}}Fail{{/if}}", json!({"score": 75}), "Pass"),
        ("{{#if score > 50}}Pass{{#else}}Fail{{/if}}", json!({"score": 30}), "Fail"),
        ("{{#if n == 1}}one{{#elseif n == 2}}two{{#else}}many{{/if}}", json!({"n": 2}), "two"),
        ("{{#if n == 1}}one{{#elseif n == 2}}two{{#else}}many{{/if}}", json!({"n": 9}), "many"),
        ("{{#if n == 1}}one{{#elseif n == 2}}two{{/if}}", json!({"n": 9}), ""),
        ("{{#if items}}some{{#else}}none{{/if}}", json!({"items": []}), "none"),
        ("{{#if user && user.admin}}admin{{/if}}", json!({"user": {"admin": true}}), "admin"),
        ("{{#if a}}{{#if b}}ab{{#else}}a{{/if}}{{/if}}", json!({"a": 1, "b": 0}), "a"),
    ];

    for (input, data, expected) in tests {
        println!("{:?} -> {:?}", input, expected);
        let context = Context::from_value(data).unwrap();
        assert_eq!(render_template(input, &context).await.unwrap(), expected);
    }
}

#[tokio::test]
async fn render_not() {
    let mut context = Context::new();
    context.insert("items", &json!([]));
    context.insert("name", &"Bob");

    let inputs = vec![
        ("{{#not items}}empty{{/not}}", "empty"),
        ("{{#not name}}anonymous{{/not}}", ""),
        ("{{#not name == \"Ann\"}}not Ann{{/not}}", "not Ann"),
    ];

    for (input, expected) in inputs {
        println!("{:?} -> {:?}", input, expected);
        assert_eq!(render_template(input, &context).await.unwrap(), expected);
    }
}

#[tokio::test]
async fn failing_conditions_are_false() {
    let inputs = vec![
        ("{{#if missing > 1}}yes{{#else}}no{{/if}}", "no"),
        ("{{#if \"a\" - 1}}yes{{#elseif true}}fallback{{/if}}", "fallback"),
        ("{{#not missing > 1}}rendered{{/not}}", "rendered"),
    ];

    for (input, expected) in inputs {
        println!("{:?} -> {:?}", input, expected);
        assert_eq!(render_template(input, &Context::new()).await.unwrap(), expected);
    }
}

#[tokio::test]
async fn render_each() {
    let mut context = Context::new();
    context.insert("items", &json!(["a", "b", "c"]));
    context.insert("scores", &json!({"alice": 1, "bob": 2}));
    context.insert("users", &json!([{"name": "A"}, {"name": "B", "site": "own"}]));
    context.insert("site", &"S");
    context.insert("name", &"global");
    context.insert("rows", &json!([[1, 2], [3]]));

    let inputs = vec![
        ("{{#each items}}{{ @index }}:{{ this }} {{/each}}", "0:a 1:b 2:c "),
        ("{{#each scores}}{{ @key }}={{ this }};{{/each}}", "alice=1;bob=2;"),
        ("{{#each users}}{{ name }}{{/each}}", "AB"),
        ("{{#each users}}{{ site }},{{/each}}", "S,own,"),
        ("{{#each users}}{{ this.name }}{{/each}}{{ name }}", "ABglobal"),
        ("{{#each rows}}{{#each1 this}}{{ @index }}{{/each1}}|{{/each}}", "01|0|"),
        ("{{#each rows}}{{#each1 this}}{{/each1}}{{ @index }}{{/each}}", "01"),
        ("{{#each rows}}{{#each1 this}}{{ this * 10 }} {{/each1}}{{/each}}", "10 20 30 "),
        ("{{#each missing}}x{{/each}}", ""),
        ("{{#each []}}x{{/each}}", ""),
        ("{{#each items}}{{#if @index > 0}}, {{/if}}{{ this }}{{/each}}", "a, b, c"),
    ];

    for (input, expected) in inputs {
        println!("{:?} -> {:?}", input, expected);
        assert_eq!(render_template(input, &context).await.unwrap(), expected);
    }
}

#[tokio::test]
async fn render_filters() {
    let mut context = Context::new();
    context.insert("items", &json!(["a", "b", "c"]));
    context.insert("name", &"bob");

    let inputs = vec![
        ("{{ \"hello\" | uppercase | truncate(3) }}", "HEL..."),
        ("{{ items | join(\", \") }}", "a, b, c"),
        ("{{ items | first | uppercase }}", "A"),
        ("{{ items | length }}", "3"),
        ("{{ 3.14159 | round(2) }}", "3.14"),
        ("{{ missing | default(\"n/a\") }}", "n/a"),
        ("{{ name | capitalize }}", "Bob"),
        ("{{ items.length | pluralize }}", "s"),
        // filters bind tighter than operators
        ("{{ 1 + 2 | string }}", "12"),
        ("{{ (1 + 2) | string }}", "3"),
    ];

    for (input, expected) in inputs {
        println!("{:?} -> {:?}", input, expected);
        assert_eq!(render_template(input, &context).await.unwrap(), expected);
    }
}

#[tokio::test]
async fn render_custom_filter() {
    let mut engine = Engine::with_loader(EngineConfig::default(), MemoryLoader::new());
    engine.register_filter("shout", |value: &Value, args: &[Value]| -> crate::errors::Result<Value> {
        let times = args.first().and_then(Value::as_u64).unwrap_or(1) as usize;
        Ok(Value::String(format!("{}{}", value.as_str().unwrap_or_default(), "!".repeat(times))))
    });

    let result = engine.render_str("{{ \"hey\" | shout(3) }}", &Context::new()).await.unwrap();
    assert_eq!(result, "hey!!!");
}

#[tokio::test]
async fn cycle_through_values() {
    let mut context = Context::new();
    context.insert("rows", &json!([1, 2, 3]));

    let result = render_template(
        "{{#set stripe = null | cycle(\"odd\", \"even\")}}{{#each rows}}{{ stripe | next }} {{/each}}",
        &context,
    )
    .await
    .unwrap();
    assert_eq!(result, "odd even odd ");
}

#[tokio::test]
async fn rendering_is_idempotent() {
    let mut context = Context::new();
    context.insert("items", &json!(["a", "b"]));
    let engine = Engine::with_loader(EngineConfig::default(), MemoryLoader::new());
    let template = "{{#set count = items.length}}{{#each items}}{{ this }}{{/each}}{{ count }}";

    let first = engine.render_str(template, &context).await.unwrap();
    let second = engine.render_str(template, &context).await.unwrap();
    assert_eq!(first, "ab2");
    assert_eq!(first, second);
}

#[tokio::test]
async fn literal_text_is_kept_as_is() {
    let template = "<p class=\"a\">\n  Ünïcödé & text / { single braces }\n</p>\n";
    assert_eq!(render_template(template, &Context::new()).await.unwrap(), template);
}
