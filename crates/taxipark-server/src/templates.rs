use tera::Tera;

/// Templates are compiled into the binary; there is no template directory to
/// deploy alongside it.
const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    (
        "registration/login.html",
        include_str!("../templates/registration/login.html"),
    ),
    ("taxi/index.html", include_str!("../templates/taxi/index.html")),
    (
        "taxi/manufacturer_list.html",
        include_str!("../templates/taxi/manufacturer_list.html"),
    ),
    (
        "taxi/manufacturer_form.html",
        include_str!("../templates/taxi/manufacturer_form.html"),
    ),
    (
        "taxi/manufacturer_confirm_delete.html",
        include_str!("../templates/taxi/manufacturer_confirm_delete.html"),
    ),
    (
        "taxi/car_list.html",
        include_str!("../templates/taxi/car_list.html"),
    ),
    (
        "taxi/car_detail.html",
        include_str!("../templates/taxi/car_detail.html"),
    ),
    (
        "taxi/car_form.html",
        include_str!("../templates/taxi/car_form.html"),
    ),
    (
        "taxi/car_confirm_delete.html",
        include_str!("../templates/taxi/car_confirm_delete.html"),
    ),
    (
        "taxi/driver_list.html",
        include_str!("../templates/taxi/driver_list.html"),
    ),
    (
        "taxi/driver_detail.html",
        include_str!("../templates/taxi/driver_detail.html"),
    ),
    (
        "taxi/driver_form.html",
        include_str!("../templates/taxi/driver_form.html"),
    ),
    (
        "taxi/driver_license_update_form.html",
        include_str!("../templates/taxi/driver_license_update_form.html"),
    ),
    (
        "taxi/driver_confirm_delete.html",
        include_str!("../templates/taxi/driver_confirm_delete.html"),
    ),
    ("admin/index.html", include_str!("../templates/admin/index.html")),
    (
        "admin/driver_list.html",
        include_str!("../templates/admin/driver_list.html"),
    ),
    (
        "admin/car_list.html",
        include_str!("../templates/admin/car_list.html"),
    ),
    (
        "admin/manufacturer_list.html",
        include_str!("../templates/admin/manufacturer_list.html"),
    ),
    (
        "admin/driver_form.html",
        include_str!("../templates/admin/driver_form.html"),
    ),
    (
        "admin/confirm_delete.html",
        include_str!("../templates/admin/confirm_delete.html"),
    ),
];

pub fn build() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES.to_vec())?;
    Ok(tera)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tera::Context;

    #[test]
    fn all_templates_compile() {
        build().expect("templates must compile");
    }

    #[test]
    fn index_renders_counts() {
        let tera = build().expect("templates");
        let mut ctx = Context::new();
        ctx.insert("user", &Option::<()>::None);
        ctx.insert("num_drivers", &3_u64);
        ctx.insert("num_cars", &2_u64);
        ctx.insert("num_manufacturers", &1_u64);
        let html = tera.render("taxi/index.html", &ctx).expect("render");
        assert!(html.contains("Drivers: 3"));
        assert!(html.contains("Cars: 2"));
        assert!(html.contains("Manufacturers: 1"));
    }

    #[test]
    fn form_templates_tolerate_missing_error_keys() {
        let tera = build().expect("templates");
        let mut ctx = Context::new();
        ctx.insert("user", &Option::<()>::None);
        ctx.insert("heading", "Add manufacturer");
        ctx.insert("action", "/manufacturers/create/");
        ctx.insert("name", "");
        ctx.insert("country", "");
        ctx.insert("errors", &std::collections::BTreeMap::<String, Vec<String>>::new());
        let html = tera
            .render("taxi/manufacturer_form.html", &ctx)
            .expect("render");
        assert!(html.contains("Add manufacturer"));
    }
}
