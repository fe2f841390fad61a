use super::*;

impl Workbook {
    /// Create a new empty workbook containing a single empty sheet named "Sheet1".
    pub fn new() -> Self {
        let shared_strings = Sst::default();
        let sst_runtime = SharedStringTable::from_sst(&shared_strings);
        let mut wb = Self {
            format: WorkbookFormat::default(),
            content_types: ContentTypes::default(),
            package_rels: relationships::package_rels(),
            workbook_xml: WorkbookXml::default(),
            workbook_rels: relationships::workbook_rels(),
            worksheets: vec![("Sheet1".to_string(), WorksheetXml::default())],
            stylesheet: StyleSheet::default(),
            sst_runtime,
            sheet_comments: vec![None],
            raw_charts: vec![],
            drawings: vec![],
            images: vec![],
            worksheet_drawings: HashMap::new(),
            worksheet_rels: HashMap::new(),
            drawing_rels: HashMap::new(),
            core_properties: None,
            app_properties: None,
            custom_properties: None,
            raw_pivot_parts: vec![],
            theme_xml: None,
            theme_colors: crate::theme::default_theme_colors(),
            sheet_vml: vec![None],
            vba_blob: None,
            tables: vec![],
            sheet_name_index: HashMap::new(),
            source_path: None,
        };
        wb.rebuild_sheet_index();
        wb
    }

    /// Open an existing `.xlsx` file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, &OpenOptions::default())
    }

    /// Open an existing `.xlsx` file from disk, applying the given [`OpenOptions`].
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: &OpenOptions) -> Result<Self> {
        let data = std::fs::read(path.as_ref()).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.as_ref().display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        let cursor = std::io::Cursor::new(data);
        let mut archive = zip::ZipArchive::new(cursor).map_err(|e| Error::Zip(e.to_string()))?;
        let mut wb = Self::from_archive(&mut archive, options)?;
        wb.source_path = Some(path.as_ref().to_path_buf());
        Ok(wb)
    }

    /// Enforce the `max_zip_entries` and `max_unzip_size` limits from `options`.
    fn check_zip_limits<R: std::io::Read + std::io::Seek>(
        archive: &mut zip::ZipArchive<R>,
        options: &OpenOptions,
    ) -> Result<()> {
        let entry_count = archive.len();
        if let Some(max) = options.max_zip_entries {
            if entry_count > max {
                return Err(Error::ZipEntryCountExceeded {
                    actual: entry_count,
                    max,
                });
            }
        }
        if let Some(max) = options.max_unzip_size {
            let mut total: u64 = 0;
            for i in 0..entry_count {
                let entry = archive.by_index(i).map_err(|e| Error::Zip(e.to_string()))?;
                total += entry.size();
                if total > max {
                    return Err(Error::ZipSizeExceeded { actual: total, max });
                }
            }
        }
        Ok(())
    }

    /// Build a Workbook from an already-opened ZIP archive.
    fn from_archive<R: std::io::Read + std::io::Seek>(
        archive: &mut zip::ZipArchive<R>,
        options: &OpenOptions,
    ) -> Result<Self> {
        Self::check_zip_limits(archive, options)?;

        // Parse [Content_Types].xml
        let content_types: ContentTypes = read_xml_part(archive, "[Content_Types].xml")?;

        // Parse _rels/.rels
        let package_rels: Relationships = read_xml_part(archive, "_rels/.rels")?;

        // Parse xl/workbook.xml
        let workbook_xml: WorkbookXml = read_xml_part(archive, "xl/workbook.xml")?;

        // Parse xl/_rels/workbook.xml.rels
        let workbook_rels: Relationships = read_xml_part(archive, "xl/_rels/workbook.xml.rels")?;

        // Parse each worksheet referenced in the workbook. Sheets excluded by
        // the `sheets` filter are represented as empty worksheets; their XML
        // is still resolved to a path so relationship lookups keep working.
        let mut worksheets = Vec::new();
        let mut worksheet_paths = Vec::new();
        for sheet_entry in &workbook_xml.sheets.sheets {
            // Find the relationship target for this sheet's rId.
            let rel = workbook_rels
                .relationships
                .iter()
                .find(|r| r.id == sheet_entry.r_id && r.rel_type == rel_types::WORKSHEET);

            let rel = rel.ok_or_else(|| {
                Error::Internal(format!(
                    "missing worksheet relationship for sheet '{}'",
                    sheet_entry.name
                ))
            })?;

            let sheet_path = resolve_relationship_target("xl/workbook.xml", &rel.target);

            let mut ws: WorksheetXml = if options.should_parse_sheet(&sheet_entry.name) {
                read_xml_part(archive, &sheet_path)?
            } else {
                WorksheetXml::default()
            };

            if let Some(max_rows) = options.sheet_rows {
                ws.sheet_data.rows.retain(|r| r.r <= max_rows);
            }

            worksheets.push((sheet_entry.name.clone(), ws));
            worksheet_paths.push(sheet_path);
        }

        // Parse xl/styles.xml
        let stylesheet: StyleSheet = read_xml_part(archive, "xl/styles.xml")?;

        // Parse xl/sharedStrings.xml (optional -- may not exist for workbooks with no strings)
        let shared_strings: Sst =
            read_xml_part(archive, "xl/sharedStrings.xml").unwrap_or_default();

        let sst_runtime = SharedStringTable::from_sst(&shared_strings);

        // Parse xl/theme/theme1.xml (optional -- preserved as raw bytes for round-trip).
        let (theme_xml, theme_colors) = match read_bytes_part(archive, "xl/theme/theme1.xml") {
            Ok(bytes) => {
                let colors = sheetkit_xml::theme::parse_theme_colors(&bytes);
                (Some(bytes), colors)
            }
            Err(_) => (None, crate::theme::default_theme_colors()),
        };

        // Parse per-sheet worksheet relationship files (optional).
        let mut worksheet_rels: HashMap<usize, Relationships> = HashMap::new();
        for (i, sheet_path) in worksheet_paths.iter().enumerate() {
            let rels_path = relationship_part_path(sheet_path);
            if let Ok(rels) = read_xml_part::<Relationships, _>(archive, &rels_path) {
                worksheet_rels.insert(i, rels);
            }
        }

        // Parse table parts referenced from each worksheet's relationships.
        // Skipped entirely under `ParseMode::ReadFast`.
        let mut tables: Vec<(String, sheetkit_xml::table::TableXml, usize)> = Vec::new();
        if !options.is_read_fast() {
            for (sheet_idx, sheet_path) in worksheet_paths.iter().enumerate() {
                let Some(rels) = worksheet_rels.get(&sheet_idx) else {
                    continue;
                };
                for rel in rels
                    .relationships
                    .iter()
                    .filter(|r| r.rel_type == rel_types::TABLE)
                {
                    let table_path = resolve_relationship_target(sheet_path, &rel.target);
                    if let Ok(table_xml) =
                        read_xml_part::<sheetkit_xml::table::TableXml, _>(archive, &table_path)
                    {
                        tables.push((table_path, table_xml, sheet_idx));
                    }
                }
            }
        }

        // Parse comments, VML drawings, drawings, drawing rels, and images.
        // Skipped entirely under `ParseMode::ReadFast`.
        let mut sheet_comments: Vec<Option<Comments>> = vec![None; worksheets.len()];
        let mut sheet_vml: Vec<Option<Vec<u8>>> = vec![None; worksheets.len()];
        let mut drawings: Vec<(String, WsDr)> = Vec::new();
        let mut worksheet_drawings: HashMap<usize, usize> = HashMap::new();
        let mut drawing_path_to_idx: HashMap<String, usize> = HashMap::new();

        if !options.is_read_fast() {
            for (sheet_idx, sheet_path) in worksheet_paths.iter().enumerate() {
                let Some(rels) = worksheet_rels.get(&sheet_idx) else {
                    continue;
                };

                if let Some(comment_rel) = rels
                    .relationships
                    .iter()
                    .find(|r| r.rel_type == rel_types::COMMENTS)
                {
                    let comment_path =
                        resolve_relationship_target(sheet_path, &comment_rel.target);
                    if let Ok(comments) = read_xml_part::<Comments, _>(archive, &comment_path) {
                        sheet_comments[sheet_idx] = Some(comments);
                    }
                }

                if let Some(vml_rel) = rels
                    .relationships
                    .iter()
                    .find(|r| r.rel_type == rel_types::VML_DRAWING)
                {
                    let vml_path = resolve_relationship_target(sheet_path, &vml_rel.target);
                    if let Ok(bytes) = read_bytes_part(archive, &vml_path) {
                        sheet_vml[sheet_idx] = Some(bytes);
                    }
                }

                if let Some(drawing_rel) = rels
                    .relationships
                    .iter()
                    .find(|r| r.rel_type == rel_types::DRAWING)
                {
                    let drawing_path =
                        resolve_relationship_target(sheet_path, &drawing_rel.target);
                    let drawing_idx = if let Some(idx) = drawing_path_to_idx.get(&drawing_path) {
                        *idx
                    } else if let Ok(drawing) = read_xml_part::<WsDr, _>(archive, &drawing_path) {
                        let idx = drawings.len();
                        drawings.push((drawing_path.clone(), drawing));
                        drawing_path_to_idx.insert(drawing_path.clone(), idx);
                        idx
                    } else {
                        continue;
                    };
                    worksheet_drawings.insert(sheet_idx, drawing_idx);
                }
            }

            // Fallback: load drawing parts listed in content types even when they
            // are not discoverable via worksheet rel parsing.
            for ovr in &content_types.overrides {
                if ovr.content_type != mime_types::DRAWING {
                    continue;
                }
                let drawing_path = ovr.part_name.trim_start_matches('/').to_string();
                if drawing_path_to_idx.contains_key(&drawing_path) {
                    continue;
                }
                if let Ok(drawing) = read_xml_part::<WsDr, _>(archive, &drawing_path) {
                    let idx = drawings.len();
                    drawings.push((drawing_path.clone(), drawing));
                    drawing_path_to_idx.insert(drawing_path, idx);
                }
            }
        }

        let mut drawing_rels: HashMap<usize, Relationships> = HashMap::new();
        let mut raw_charts: Vec<(String, Vec<u8>)> = Vec::new();
        let mut images: Vec<(String, Vec<u8>)> = Vec::new();
        let mut seen_chart_paths: HashSet<String> = HashSet::new();
        let mut seen_image_paths: HashSet<String> = HashSet::new();

        if !options.is_read_fast() {
            for (drawing_idx, (drawing_path, _)) in drawings.iter().enumerate() {
                let drawing_rels_path = relationship_part_path(drawing_path);
                let Ok(rels) = read_xml_part::<Relationships, _>(archive, &drawing_rels_path)
                else {
                    continue;
                };

                for rel in &rels.relationships {
                    if rel.rel_type == rel_types::CHART {
                        let chart_path = resolve_relationship_target(drawing_path, &rel.target);
                        if seen_chart_paths.insert(chart_path.clone()) {
                            if let Ok(bytes) = read_bytes_part(archive, &chart_path) {
                                raw_charts.push((chart_path, bytes));
                            }
                        }
                    } else if rel.rel_type == rel_types::IMAGE {
                        let image_path = resolve_relationship_target(drawing_path, &rel.target);
                        if seen_image_paths.insert(image_path.clone()) {
                            if let Ok(bytes) = read_bytes_part(archive, &image_path) {
                                images.push((image_path, bytes));
                            }
                        }
                    }
                }

                drawing_rels.insert(drawing_idx, rels);
            }

            // Fallback: load chart parts listed in content types even when no
            // drawing relationship was read. Charts are out of scope for this
            // crate's data model; their bytes are preserved verbatim.
            for ovr in &content_types.overrides {
                if ovr.content_type != mime_types::CHART {
                    continue;
                }
                let chart_path = ovr.part_name.trim_start_matches('/').to_string();
                if seen_chart_paths.insert(chart_path.clone()) {
                    if let Ok(bytes) = read_bytes_part(archive, &chart_path) {
                        raw_charts.push((chart_path, bytes));
                    }
                }
            }
        }

        // Parse docProps/core.xml, docProps/app.xml, docProps/custom.xml
        // (optional). Skipped under `ParseMode::ReadFast`.
        let (core_properties, app_properties, custom_properties) = if !options.is_read_fast() {
            let core_properties = read_string_part(archive, "docProps/core.xml")
                .ok()
                .and_then(|xml_str| {
                    sheetkit_xml::doc_props::deserialize_core_properties(&xml_str).ok()
                });
            let app_properties: Option<sheetkit_xml::doc_props::ExtendedProperties> =
                read_xml_part(archive, "docProps/app.xml").ok();
            let custom_properties = read_string_part(archive, "docProps/custom.xml")
                .ok()
                .and_then(|xml_str| {
                    sheetkit_xml::doc_props::deserialize_custom_properties(&xml_str).ok()
                });
            (core_properties, app_properties, custom_properties)
        } else {
            (None, None, None)
        };

        // Pivot tables and pivot caches are out of scope for this crate's data
        // model; their parts are preserved verbatim as opaque bytes. Skipped
        // under `ParseMode::ReadFast`.
        let mut raw_pivot_parts = Vec::new();
        if !options.is_read_fast() {
            for ovr in &content_types.overrides {
                let path = ovr.part_name.trim_start_matches('/');
                if ovr.content_type == mime_types::PIVOT_CACHE_DEFINITION
                    || ovr.content_type == mime_types::PIVOT_TABLE
                    || ovr.content_type == mime_types::PIVOT_CACHE_RECORDS
                {
                    if let Ok(bytes) = read_bytes_part(archive, path) {
                        raw_pivot_parts.push((path.to_string(), bytes));
                    }
                }
            }
        }

        // VBA project binary, preserved opaquely for macro-enabled workbooks.
        // Skipped under `ParseMode::ReadFast`.
        let vba_blob = if !options.is_read_fast() {
            read_bytes_part(archive, "xl/vbaProject.bin").ok()
        } else {
            None
        };

        let format = content_types
            .overrides
            .iter()
            .find(|o| o.part_name == "/xl/workbook.xml")
            .and_then(|o| WorkbookFormat::from_content_type(&o.content_type))
            .unwrap_or_default();

        let mut wb = Self {
            format,
            content_types,
            package_rels,
            workbook_xml,
            workbook_rels,
            worksheets,
            stylesheet,
            sst_runtime,
            sheet_comments,
            raw_charts,
            drawings,
            images,
            worksheet_drawings,
            worksheet_rels,
            drawing_rels,
            core_properties,
            app_properties,
            custom_properties,
            raw_pivot_parts,
            theme_xml,
            theme_colors,
            sheet_vml,
            vba_blob,
            tables,
            sheet_name_index: HashMap::new(),
            source_path: None,
        };
        wb.rebuild_sheet_index();
        Ok(wb)
    }

    /// Save the workbook to a `.xlsx` file at the given path, overwriting
    /// anything already there. Does not update the path tracked for
    /// [`Workbook::save_in_place`]; use [`Workbook::save_as`] for that.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.write_zip_contents(&mut zip, options)?;
        zip.finish().map_err(|e| Error::Zip(e.to_string()))?;
        Ok(())
    }

    /// Save the workbook to `path`, honoring `mode`'s overwrite policy, and
    /// remember `path` so a later no-argument [`Workbook::save_in_place`]
    /// writes back to it.
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P, mode: OverwriteMode) -> Result<()> {
        if mode == OverwriteMode::DoNotOverwrite && path.as_ref().exists() {
            return Err(Error::FileExists {
                path: path.as_ref().display().to_string(),
            });
        }
        self.save(path.as_ref())?;
        self.source_path = Some(path.as_ref().to_path_buf());
        Ok(())
    }

    /// Save back to the path this workbook was opened from or last saved to
    /// via [`Workbook::save_as`]. Fails with [`Error::InvalidArgument`] if no
    /// such path is known.
    pub fn save_in_place(&self) -> Result<()> {
        let path = self.source_path.as_ref().ok_or_else(|| Error::InvalidArgument {
            message: "no save path: workbook was never opened from or saved to a path".to_string(),
        })?;
        self.save(path)
    }

    /// Serialize the workbook to an in-memory `.xlsx` buffer.
    pub fn save_to_buffer(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let cursor = std::io::Cursor::new(&mut buf);
            let mut zip = zip::ZipWriter::new(cursor);
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            self.write_zip_contents(&mut zip, options)?;
            zip.finish().map_err(|e| Error::Zip(e.to_string()))?;
        }
        Ok(buf)
    }

    /// Open a workbook from an in-memory `.xlsx` buffer.
    pub fn open_from_buffer(data: &[u8]) -> Result<Self> {
        Self::open_from_buffer_with_options(data, &OpenOptions::default())
    }

    /// Open a workbook from an in-memory `.xlsx` buffer, applying the given
    /// [`OpenOptions`].
    pub fn open_from_buffer_with_options(data: &[u8], options: &OpenOptions) -> Result<Self> {
        let cursor = std::io::Cursor::new(data);
        let mut archive = zip::ZipArchive::new(cursor).map_err(|e| Error::Zip(e.to_string()))?;
        Self::from_archive(&mut archive, options)
    }

    /// Write all workbook parts into the given ZIP writer.
    fn write_zip_contents<W: std::io::Write + std::io::Seek>(
        &self,
        zip: &mut zip::ZipWriter<W>,
        options: SimpleFileOptions,
    ) -> Result<()> {
        let mut content_types = self.content_types.clone();
        let mut worksheet_rels = self.worksheet_rels.clone();

        // Synchronize comment and VML parts with worksheet relationships/content types.
        // Per-sheet VML bytes to write: (sheet_idx, zip_path, bytes).
        let mut vml_parts_to_write: Vec<(usize, String, Vec<u8>)> = Vec::new();
        // Per-sheet legacy drawing relationship IDs for worksheet XML serialization.
        let mut legacy_drawing_rids: HashMap<usize, String> = HashMap::new();

        // Ensure the vml extension default content type is present if any VML exists.
        let mut has_any_vml = false;

        for sheet_idx in 0..self.worksheets.len() {
            let has_comments = self
                .sheet_comments
                .get(sheet_idx)
                .and_then(|c| c.as_ref())
                .is_some();
            if let Some(rels) = worksheet_rels.get_mut(&sheet_idx) {
                rels.relationships
                    .retain(|r| r.rel_type != rel_types::COMMENTS);
                rels.relationships
                    .retain(|r| r.rel_type != rel_types::VML_DRAWING);
            }
            if !has_comments {
                continue;
            }

            let comment_path = format!("xl/comments{}.xml", sheet_idx + 1);
            let part_name = format!("/{}", comment_path);
            if !content_types
                .overrides
                .iter()
                .any(|o| o.part_name == part_name && o.content_type == mime_types::COMMENTS)
            {
                content_types.overrides.push(ContentTypeOverride {
                    part_name,
                    content_type: mime_types::COMMENTS.to_string(),
                });
            }

            let sheet_path = self.sheet_part_path(sheet_idx);
            let target = relative_relationship_target(&sheet_path, &comment_path);
            let rels = worksheet_rels
                .entry(sheet_idx)
                .or_insert_with(default_relationships);
            let rid = crate::sheet::next_rid(&rels.relationships);
            rels.relationships.push(Relationship {
                id: rid,
                rel_type: rel_types::COMMENTS.to_string(),
                target,
                target_mode: None,
            });

            // Determine VML bytes: use preserved bytes if available, otherwise generate.
            let vml_path = format!("xl/drawings/vmlDrawing{}.vml", sheet_idx + 1);
            let vml_bytes =
                if let Some(bytes) = self.sheet_vml.get(sheet_idx).and_then(|v| v.as_ref()) {
                    bytes.clone()
                } else {
                    // Generate VML from comment cell references.
                    let comments = self.sheet_comments[sheet_idx].as_ref().unwrap();
                    let cells: Vec<&str> = comments
                        .comment_list
                        .comments
                        .iter()
                        .map(|c| c.r#ref.as_str())
                        .collect();
                    crate::vml::build_vml_drawing(&cells).into_bytes()
                };

            let vml_part_name = format!("/{}", vml_path);
            if !content_types
                .overrides
                .iter()
                .any(|o| o.part_name == vml_part_name && o.content_type == mime_types::VML_DRAWING)
            {
                content_types.overrides.push(ContentTypeOverride {
                    part_name: vml_part_name,
                    content_type: mime_types::VML_DRAWING.to_string(),
                });
            }

            let vml_target = relative_relationship_target(&sheet_path, &vml_path);
            let vml_rid = crate::sheet::next_rid(&rels.relationships);
            rels.relationships.push(Relationship {
                id: vml_rid.clone(),
                rel_type: rel_types::VML_DRAWING.to_string(),
                target: vml_target,
                target_mode: None,
            });

            legacy_drawing_rids.insert(sheet_idx, vml_rid);
            vml_parts_to_write.push((sheet_idx, vml_path, vml_bytes));
            has_any_vml = true;
        }

        // Add vml extension default content type if needed.
        if has_any_vml && !content_types.defaults.iter().any(|d| d.extension == "vml") {
            content_types.defaults.push(ContentTypeDefault {
                extension: "vml".to_string(),
                content_type: mime_types::VML_DRAWING.to_string(),
            });
        }

        // Wire up table parts: content type override, worksheet relationship,
        // and a <tableParts> reference on the owning worksheet.
        let mut table_parts_by_sheet: HashMap<usize, Vec<sheetkit_xml::worksheet::TablePart>> =
            HashMap::new();
        for (table_idx, (table_path, _, sheet_idx)) in self.tables.iter().enumerate() {
            let part_name = format!("/{table_path}");
            if !content_types
                .overrides
                .iter()
                .any(|o| o.part_name == part_name)
            {
                content_types.overrides.push(ContentTypeOverride {
                    part_name,
                    content_type: mime_types::TABLE.to_string(),
                });
            }

            let sheet_path = self.sheet_part_path(*sheet_idx);
            let target = relative_relationship_target(&sheet_path, table_path);
            let rels = worksheet_rels
                .entry(*sheet_idx)
                .or_insert_with(default_relationships);
            let rid = crate::sheet::next_rid(&rels.relationships);
            rels.relationships.push(Relationship {
                id: rid.clone(),
                rel_type: rel_types::TABLE.to_string(),
                target,
                target_mode: None,
            });
            let _ = table_idx;
            table_parts_by_sheet
                .entry(*sheet_idx)
                .or_default()
                .push(sheetkit_xml::worksheet::TablePart { r_id: rid });
        }

        self.check_package_consistency(
            &content_types,
            &worksheet_rels,
            &legacy_drawing_rids,
            &table_parts_by_sheet,
        )?;

        // [Content_Types].xml
        write_xml_part(zip, "[Content_Types].xml", &content_types, options)?;

        // _rels/.rels
        write_xml_part(zip, "_rels/.rels", &self.package_rels, options)?;

        // xl/workbook.xml
        write_xml_part(zip, "xl/workbook.xml", &self.workbook_xml, options)?;

        // xl/_rels/workbook.xml.rels
        write_xml_part(
            zip,
            "xl/_rels/workbook.xml.rels",
            &self.workbook_rels,
            options,
        )?;

        // xl/worksheets/sheet{N}.xml
        for (i, (_name, ws)) in self.worksheets.iter().enumerate() {
            let entry_name = self.sheet_part_path(i);
            let needs_legacy_drawing = legacy_drawing_rids.contains_key(&i);
            let needs_table_parts = table_parts_by_sheet.contains_key(&i);

            if !needs_legacy_drawing && !needs_table_parts {
                write_xml_part(zip, &entry_name, ws, options)?;
            } else {
                let mut ws_clone = ws.clone();
                if let Some(rid) = legacy_drawing_rids.get(&i) {
                    ws_clone.legacy_drawing =
                        Some(sheetkit_xml::worksheet::LegacyDrawingRef { r_id: rid.clone() });
                }
                if let Some(parts) = table_parts_by_sheet.get(&i) {
                    ws_clone.table_parts = Some(sheetkit_xml::worksheet::TableParts {
                        count: Some(parts.len() as u32),
                        table_parts: parts.clone(),
                    });
                }
                write_xml_part(zip, &entry_name, &ws_clone, options)?;
            }
        }

        // xl/tables/table{N}.xml
        for (path, table_xml, _) in &self.tables {
            write_xml_part(zip, path, table_xml, options)?;
        }

        // xl/styles.xml
        write_xml_part(zip, "xl/styles.xml", &self.stylesheet, options)?;

        // xl/sharedStrings.xml -- write from the runtime SST
        let sst_xml = self.sst_runtime.to_sst();
        write_xml_part(zip, "xl/sharedStrings.xml", &sst_xml, options)?;

        // xl/comments{N}.xml -- write per-sheet comments
        for (i, comments) in self.sheet_comments.iter().enumerate() {
            if let Some(ref c) = comments {
                let entry_name = format!("xl/comments{}.xml", i + 1);
                write_xml_part(zip, &entry_name, c, options)?;
            }
        }

        // xl/drawings/vmlDrawing{N}.vml -- write VML drawing parts
        for (_sheet_idx, vml_path, vml_bytes) in &vml_parts_to_write {
            zip.start_file(vml_path, options)
                .map_err(|e| Error::Zip(e.to_string()))?;
            zip.write_all(vml_bytes)?;
        }

        // xl/drawings/drawing{N}.xml -- write drawing parts
        for (path, drawing) in &self.drawings {
            write_xml_part(zip, path, drawing, options)?;
        }

        // xl/charts/chart{N}.xml -- write chart parts preserved as raw bytes
        for (path, data) in &self.raw_charts {
            zip.start_file(path, options)
                .map_err(|e| Error::Zip(e.to_string()))?;
            zip.write_all(data)?;
        }

        // xl/media/image{N}.{ext} -- write image data
        for (path, data) in &self.images {
            zip.start_file(path, options)
                .map_err(|e| Error::Zip(e.to_string()))?;
            zip.write_all(data)?;
        }

        // xl/worksheets/_rels/sheet{N}.xml.rels -- write worksheet relationships
        for (sheet_idx, rels) in &worksheet_rels {
            let sheet_path = self.sheet_part_path(*sheet_idx);
            let path = relationship_part_path(&sheet_path);
            write_xml_part(zip, &path, rels, options)?;
        }

        // xl/drawings/_rels/drawing{N}.xml.rels -- write drawing relationships
        for (drawing_idx, rels) in &self.drawing_rels {
            if let Some((drawing_path, _)) = self.drawings.get(*drawing_idx) {
                let path = relationship_part_path(drawing_path);
                write_xml_part(zip, &path, rels, options)?;
            }
        }

        // xl/pivotTables, xl/pivotCache -- write pivot parts preserved as raw bytes
        for (path, data) in &self.raw_pivot_parts {
            zip.start_file(path, options)
                .map_err(|e| Error::Zip(e.to_string()))?;
            zip.write_all(data)?;
        }

        // xl/theme/theme1.xml
        {
            let default_theme = crate::theme::default_theme_xml();
            let theme_bytes = self.theme_xml.as_deref().unwrap_or(&default_theme);
            zip.start_file("xl/theme/theme1.xml", options)
                .map_err(|e| Error::Zip(e.to_string()))?;
            zip.write_all(theme_bytes)?;
        }

        // docProps/core.xml
        if let Some(ref props) = self.core_properties {
            let xml_str = sheetkit_xml::doc_props::serialize_core_properties(props);
            zip.start_file("docProps/core.xml", options)
                .map_err(|e| Error::Zip(e.to_string()))?;
            zip.write_all(xml_str.as_bytes())?;
        }

        // docProps/app.xml
        if let Some(ref props) = self.app_properties {
            write_xml_part(zip, "docProps/app.xml", props, options)?;
        }

        // docProps/custom.xml
        if let Some(ref props) = self.custom_properties {
            let xml_str = sheetkit_xml::doc_props::serialize_custom_properties(props);
            zip.start_file("docProps/custom.xml", options)
                .map_err(|e| Error::Zip(e.to_string()))?;
            zip.write_all(xml_str.as_bytes())?;
        }

        // xl/vbaProject.bin -- preserved opaquely for macro-enabled workbooks
        if let Some(ref blob) = self.vba_blob {
            zip.start_file("xl/vbaProject.bin", options)
                .map_err(|e| Error::Zip(e.to_string()))?;
            zip.write_all(blob)?;
        }

        Ok(())
    }

    /// Check that every relationship id a worksheet part references (via
    /// hyperlinks, the drawing reference, the legacy VML drawing reference,
    /// or table parts) resolves to an entry in that sheet's `.rels`, and that
    /// every drawing part about to be written has content-type coverage.
    /// Run once per save, just before the content-types/part writes begin.
    fn check_package_consistency(
        &self,
        content_types: &ContentTypes,
        worksheet_rels: &HashMap<usize, Relationships>,
        legacy_drawing_rids: &HashMap<usize, String>,
        table_parts_by_sheet: &HashMap<usize, Vec<sheetkit_xml::worksheet::TablePart>>,
    ) -> Result<()> {
        for (sheet_idx, (name, ws)) in self.worksheets.iter().enumerate() {
            let rels = worksheet_rels.get(&sheet_idx);
            let has_rid = |rid: &str| {
                rels.map(|r| r.relationships.iter().any(|x| x.id == rid))
                    .unwrap_or(false)
            };

            if let Some(hyperlinks) = &ws.hyperlinks {
                for link in &hyperlinks.hyperlinks {
                    if let Some(rid) = &link.r_id {
                        if !has_rid(rid) {
                            return Err(Error::InconsistentState {
                                detail: format!(
                                    "sheet '{name}' hyperlink '{}' references relationship '{rid}' with no matching entry in its .rels",
                                    link.reference
                                ),
                            });
                        }
                    }
                }
            }

            if let Some(drawing) = &ws.drawing {
                if !has_rid(&drawing.r_id) {
                    return Err(Error::InconsistentState {
                        detail: format!(
                            "sheet '{name}' drawing reference '{}' has no matching entry in its .rels",
                            drawing.r_id
                        ),
                    });
                }
            }

            if let Some(rid) = legacy_drawing_rids.get(&sheet_idx) {
                if !has_rid(rid) {
                    return Err(Error::InconsistentState {
                        detail: format!(
                            "sheet '{name}' legacy drawing reference '{rid}' has no matching entry in its .rels"
                        ),
                    });
                }
            }

            if let Some(parts) = table_parts_by_sheet.get(&sheet_idx) {
                for part in parts {
                    if !has_rid(&part.r_id) {
                        return Err(Error::InconsistentState {
                            detail: format!(
                                "sheet '{name}' table part reference '{}' has no matching entry in its .rels",
                                part.r_id
                            ),
                        });
                    }
                }
            }
        }

        for (path, _) in &self.drawings {
            let part_name = format!("/{path}");
            let covered = content_types
                .overrides
                .iter()
                .any(|o| o.part_name == part_name && o.content_type == mime_types::DRAWING);
            if !covered {
                return Err(Error::InconsistentState {
                    detail: format!("drawing part '{path}' has no content-type coverage"),
                });
            }
        }

        Ok(())
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize a value to XML with the standard XML declaration prepended.
pub(crate) fn serialize_xml<T: Serialize>(value: &T) -> Result<String> {
    let body = quick_xml::se::to_string(value).map_err(|e| Error::XmlParse(e.to_string()))?;
    Ok(format!("{XML_DECLARATION}\n{body}"))
}

/// Read a ZIP entry and deserialize it from XML.
pub(crate) fn read_xml_part<T: serde::de::DeserializeOwned, R: std::io::Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> Result<T> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| Error::Zip(e.to_string()))?;
    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .map_err(|e| Error::Zip(e.to_string()))?;
    quick_xml::de::from_str(&content).map_err(|e| Error::XmlDeserialize(e.to_string()))
}

/// Read a ZIP entry as a raw string (no serde deserialization).
pub(crate) fn read_string_part<R: std::io::Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> Result<String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| Error::Zip(e.to_string()))?;
    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .map_err(|e| Error::Zip(e.to_string()))?;
    Ok(content)
}

/// Read a ZIP entry as raw bytes.
pub(crate) fn read_bytes_part<R: std::io::Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
    name: &str,
) -> Result<Vec<u8>> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| Error::Zip(e.to_string()))?;
    let mut content = Vec::new();
    entry
        .read_to_end(&mut content)
        .map_err(|e| Error::Zip(e.to_string()))?;
    Ok(content)
}

/// Serialize a value to XML and write it as a ZIP entry.
pub(crate) fn write_xml_part<T: Serialize, W: std::io::Write + std::io::Seek>(
    zip: &mut zip::ZipWriter<W>,
    name: &str,
    value: &T,
    options: SimpleFileOptions,
) -> Result<()> {
    let xml = serialize_xml(value)?;
    zip.start_file(name, options)
        .map_err(|e| Error::Zip(e.to_string()))?;
    zip.write_all(xml.as_bytes())?;
    Ok(())
}
