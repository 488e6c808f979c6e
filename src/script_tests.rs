//! Script pipeline scenarios: registration scripts to printed modules.

#[cfg(test)]
mod tests {
    use crate::ast::{ClassMember, Expr, FunctionBody, UiElement};
    use crate::codegen::print_module;
    use crate::component::Member;
    use crate::error::TransformError;
    use crate::options::TransformOptions;
    use crate::script::parse_script;
    use std::collections::BTreeSet;

    fn used(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn convert(script: &str) -> String {
        let out = parse_script(
            Some(script),
            Some(Expr::element(UiElement::new("View"))),
            None,
            &used(&["View"]),
            &TransformOptions::default(),
        )
        .expect("script should convert");
        print_module(&out.module)
    }

    #[test]
    fn test_round_trip_page() {
        let code = convert("Page({ data: { n: 1 }, onShow(){ this.setData({n:2}) } })");
        assert_eq!(
            code,
            "import { View } from \"@tarojs/components\";\n\
             import Taro from \"@tarojs/taro\";\n\
             import withWeapp from \"@tarojs/with-weapp\";\n\
             \n\
             @withWeapp(\"Page\")\n\
             export default class _C extends Taro.Component {\n  \
             state = { n: 1 };\n\n  \
             componentDidShow() { this.setData({n:2}) }\n\n  \
             render() {\n    \
             const { n } = this.state;\n    \
             return <View />;\n  \
             }\n\
             }\n"
        );
    }

    #[test]
    fn test_state_keys_drive_destructuring() {
        let out = parse_script(
            Some("Page({ data: { count: 0, list: [] } })"),
            None,
            None,
            &BTreeSet::new(),
            &TransformOptions::default(),
        )
        .unwrap();
        assert_eq!(out.definitions[0].state_keys, vec!["count", "list"]);
        let code = print_module(&out.module);
        assert!(code.contains("const { count, list } = this.state;"), "{}", code);
        assert!(code.contains("return null;"), "{}", code);
    }

    #[test]
    fn test_no_state_means_no_destructuring() {
        let code = convert("Page({ onHide() {} })");
        assert!(!code.contains("this.state"), "{}", code);
        assert!(code.contains("componentDidHide() {}"), "{}", code);
    }

    #[test]
    fn test_lifecycle_table_is_configurable() {
        let mut opts = TransformOptions::default();
        opts.lifecycle.insert("onLaunch", "componentDidMount");
        let out = parse_script(Some("App({ onLaunch(opts) { init(opts) } })"), None, None, &BTreeSet::new(), &opts)
            .unwrap();
        let class = out.module.classes().next().unwrap();
        assert!(matches!(
            class.member("componentDidMount"),
            Some(ClassMember::Method { params, .. }) if params == "opts"
        ));
    }

    #[test]
    fn test_methods_become_arrow_properties() {
        let code = convert("Page({ tap(e) { wx.navigateTo({ url: e.url }) }, ratio: 2 })");
        assert!(code.contains("tap = (e) => { Taro.navigateTo({ url: e.url }) };"), "{}", code);
        assert!(code.contains("ratio = 2;"), "{}", code);
    }

    #[test]
    fn test_function_valued_properties() {
        let code = convert("Page({ a: function (x) { return x }, b: async (y) => y * 2, c: () => ({ d: 1 }) })");
        assert!(code.contains("a = (x) => { return x };"), "{}", code);
        assert!(code.contains("b = async (y) => y * 2;"), "{}", code);
        assert!(code.contains("c = () => ({ d: 1 });"), "{}", code);
    }

    #[test]
    fn test_accessors_and_generators_stay_methods() {
        let code = convert("Page({ get total() { return 1 }, set total(v) {}, *ids() { yield 1 } })");
        assert!(code.contains("get total() { return 1 }"), "{}", code);
        assert!(code.contains("set total(v) {}"), "{}", code);
        assert!(code.contains("*ids() { yield 1 }"), "{}", code);
    }

    #[test]
    fn test_typescript_annotations_are_kept() {
        let code = convert("Page({ async onLoad(q: Record<string, string>): Promise<void> { await q } })");
        assert!(
            code.contains("async componentWillMount(q: Record<string, string>): Promise<void> { await q }"),
            "{}",
            code
        );
    }

    #[test]
    fn test_namespace_rewrites_inside_members_and_surroundings() {
        let code = convert(
            "const app = getApp();\nfunction go() { wx.switchTab({ url: '/a' }) }\nPage({ onReady() { getCurrentPages(); go() } });",
        );
        assert!(code.contains("const app = Taro.getApp();"), "{}", code);
        assert!(code.contains("function go() { Taro.switchTab({ url: '/a' }) }"), "{}", code);
        assert!(code.contains("componentDidMount() { Taro.getCurrentPages(); go() }"), "{}", code);
    }

    #[test]
    fn test_shadowed_namespace_parameter() {
        let code = convert("Page({ use(wx) { return wx.a } })");
        assert!(code.contains("use = (Taro) => { return Taro.a };"), "{}", code);
    }

    #[test]
    fn test_config_member_precedes_render() {
        let config = serde_json::json!({ "navigationBarTitleText": "Home" });
        let out = parse_script(Some("Page({})"), None, Some(&config), &BTreeSet::new(), &TransformOptions::default())
            .unwrap();
        let class = out.module.classes().next().unwrap();
        let names: Vec<_> = class
            .body
            .iter()
            .map(|m| match m {
                ClassMember::Property { name, .. } | ClassMember::Method { name, .. } => name.as_str(),
            })
            .collect();
        assert_eq!(names, vec!["config", "render"]);
        let code = print_module(&out.module);
        assert!(code.contains("config = {\n    navigationBarTitleText: \"Home\"\n  };"), "{}", code);
    }

    #[test]
    fn test_component_kind_decorator() {
        let code = convert("Component({ properties: { title: String } })");
        assert!(code.contains("@withWeapp(\"Component\")"), "{}", code);
        assert!(code.contains("properties = { title: String };"), "{}", code);
    }

    #[test]
    fn test_member_order_follows_source() {
        let out = parse_script(
            Some("Page({ tap() {}, data: {}, onUnload() {}, label: 'x' })"),
            None,
            None,
            &BTreeSet::new(),
            &TransformOptions::default(),
        )
        .unwrap();
        let kinds: Vec<_> = out.definitions[0]
            .members
            .iter()
            .map(|m| match m {
                Member::StateField { .. } => "state",
                Member::LifecycleMethod { .. } => "lifecycle",
                Member::PlainProperty { .. } => "property",
                Member::PlainMethod { .. } => "method",
            })
            .collect();
        assert_eq!(kinds, vec!["method", "state", "lifecycle", "property"]);
    }

    #[test]
    fn test_concise_lifecycle_gets_block_body() {
        let code = convert("Page({ onShow: () => this.refresh() })");
        assert!(code.contains("componentDidShow() {\n    return this.refresh();\n  }"), "{}", code);
    }

    #[test]
    fn test_spread_fails_regardless_of_other_properties() {
        let err = parse_script(
            Some("Page({ [k]: 1, ...mixin })"),
            None,
            None,
            &BTreeSet::new(),
            &TransformOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::StructuralUnsupported { .. }));
    }

    #[test]
    fn test_lifecycle_body_is_verbatim() {
        let out = parse_script(
            Some("Page({ onLoad(options) {\n  // keep\n  this.id = options.id;\n} })"),
            None,
            None,
            &BTreeSet::new(),
            &TransformOptions::default(),
        )
        .unwrap();
        let class = out.module.classes().next().unwrap();
        let Some(ClassMember::Method { body, .. }) = class.member("componentWillMount") else {
            panic!("expected lifecycle method");
        };
        assert_eq!(
            *body,
            FunctionBody::Raw("{\n  // keep\n  this.id = options.id;\n}".into())
        );
    }
}
