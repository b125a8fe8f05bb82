//! Operator-facing strings. `{}` marks where a count goes, see [`count`].

pub struct Texts {
    pub title: &'static str,
    pub create_list: &'static str,
    pub clean_mods: &'static str,
    pub quit: &'static str,
    pub path_label: &'static str,
    pub placeholder: &'static str,
    pub ready: &'static str,

    pub error_title: &'static str,
    pub error_path: &'static str,
    pub error_no_list: &'static str,

    pub list_created_title: &'static str,
    pub list_created: &'static str,

    pub no_changes_title: &'static str,
    pub no_changes: &'static str,
    pub check_done: &'static str,

    pub unlisted_files_title: &'static str,
    pub unlisted_files: &'static str,
    pub missing_files_title: &'static str,
    pub missing_files: &'static str,
    pub new_folders_title: &'static str,
    pub delete_folders: &'static str,

    pub files_deleted: &'static str,
    pub folders_deleted: &'static str,
    pub delete_failed_title: &'static str,
    pub delete_failed: &'static str,

    pub hint_continue: &'static str,
    pub hint_confirm: &'static str,
    pub yes_keys: &'static [char],
}

pub static EN: Texts = Texts {
    title: "Games Mod Cleaner",
    create_list: "Create list",
    clean_mods: "Clean mods",
    quit: "Quit",
    path_label: " Game folder ",
    placeholder: "Enter path here",
    ready: "Ready.",

    error_title: "Error",
    error_path: "The path does not exist.",
    error_no_list: "No list file found for this path.",

    list_created_title: "List created",
    list_created: "The list file was created in the backups folder:",

    no_changes_title: "No changes",
    no_changes: "There are no changes in the file list.",
    check_done: "Check completed.",

    unlisted_files_title: "Unlisted files",
    unlisted_files: "Found {} unlisted files. Delete them?",
    missing_files_title: "Missing files",
    missing_files: "The following files are missing:",
    new_folders_title: "New folders",
    delete_folders: "Found {} new folders. Delete them?",

    files_deleted: "{} files deleted.",
    folders_deleted: "{} folders deleted.",
    delete_failed_title: "Delete errors",
    delete_failed: "{} items could not be deleted:",

    hint_continue: "[Enter] Continue",
    hint_confirm: "[Y] Yes | [N] No",
    yes_keys: &['y', 'Y'],
};

pub static ES: Texts = Texts {
    title: "Games Mod Cleaner",
    create_list: "Crear Lista",
    clean_mods: "Borrar Mods",
    quit: "Salir",
    path_label: " Carpeta del juego ",
    placeholder: "Ingrese el path aquí",
    ready: "Listo.",

    error_title: "Error",
    error_path: "El path no existe.",
    error_no_list: "No se encontró archivo de lista para este path.",

    list_created_title: "Lista creada",
    list_created: "El archivo de lista ha sido creado en la carpeta de backups:",

    no_changes_title: "Sin cambios",
    no_changes: "No hay cambios en la lista de archivos.",
    check_done: "Revisión completada.",

    unlisted_files_title: "Archivos no listados",
    unlisted_files: "Encontró {} archivos no listados. ¿Quieres borrarlos?",
    missing_files_title: "Archivos faltantes",
    missing_files: "Los siguientes archivos faltan:",
    new_folders_title: "Nuevas carpetas",
    delete_folders: "Encontró {} nuevas carpetas. ¿Quieres borrarlas?",

    files_deleted: "{} archivos borrados.",
    folders_deleted: "{} carpetas borradas.",
    delete_failed_title: "Errores al borrar",
    delete_failed: "{} elementos no se pudieron borrar:",

    hint_continue: "[Enter] Continuar",
    hint_confirm: "[S] Sí | [N] No",
    yes_keys: &['s', 'S', 'y', 'Y'],
};

/// Fills the `{}` slot of a template with `n`.
pub fn count(template: &str, n: usize) -> String {
    template.replacen("{}", &n.to_string(), 1)
}
